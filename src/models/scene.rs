// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene object data structures.
//!
//! This module defines the objects that can live on the map canvas:
//! procedural grid lines, map images, marker icons, text labels and
//! arrow groups, together with their fixed visual constants.

use crate::util::geometry::{arrow_connector_points, distance_to_segment, Point, Size};
use uuid::Uuid;

/// Identity shared by every primitive of one placed object.
pub type ObjectId = Uuid;

/// Marker icons are always drawn at this size.
pub const MARKER_SIZE: Size = Size {
    width: 70.0,
    height: 70.0,
};
pub const MARKER_OPACITY: f64 = 0.8;

pub const TEXT_FONT_SIZE: f64 = 50.0;
pub const TEXT_WIDTH: f64 = 400.0;
pub const TEXT_STROKE_WIDTH: f64 = 3.0;

/// Half length of an arrow created from a drop point.
pub const ARROW_HALF_LENGTH: f64 = 200.0;
/// Inset of the visible arrow body from its handle centers.
pub const ARROW_BODY_RADIUS: f64 = 50.0;
/// Offset of the handle circles from the logical endpoints.
pub const ARROW_HANDLE_RADIUS: f64 = -50.0;
pub const ARROW_STROKE_WIDTH: f64 = 10.0;
pub const ARROW_BORDER_WIDTH: f64 = 5.0;
pub const ARROW_POINTER_SIZE: f64 = 40.0;
pub const HANDLE_CIRCLE_RADIUS: f64 = 30.0;

pub const GRID_STROKE_WIDTH: f64 = 4.0;

/// Discriminator for the object variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    GridLine,
    MapImage,
    Marker,
    Text,
    Arrow,
}

impl ObjectKind {
    /// Human readable name used in prompts and logs.
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::GridLine => "grid line",
            ObjectKind::MapImage => "map image",
            ObjectKind::Marker => "marker",
            ObjectKind::Text => "text",
            ObjectKind::Arrow => "arrow",
        }
    }
}

/// Which piece of an object the pointer is on. Everything except arrows
/// only has a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Body,
    StartHandle,
    EndHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLine {
    pub start: Point,
    pub end: Point,
}

/// A screenshot filling one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MapImage {
    pub image_id: String,
    pub position: Point,
    pub size: Size,
}

/// An icon dropped on the marker layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub image_id: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub position: Point,
}

impl TextLabel {
    /// Rough bounds of the wrapped text, used for hit testing.
    pub fn bounds(&self) -> Size {
        // bold glyphs average about half the font size
        let glyph_width = TEXT_FONT_SIZE * 0.5;
        let per_line = (TEXT_WIDTH / glyph_width).floor().max(1.0);
        let lines: f64 = self
            .text
            .lines()
            .map(|line| (line.chars().count() as f64 / per_line).ceil().max(1.0))
            .sum();

        Size::new(TEXT_WIDTH, lines.max(1.0) * TEXT_FONT_SIZE * 1.2)
    }
}

/// The four primitives of an arrow, owned as one unit.
///
/// `body` and `border` share the same points; the handle circles sit
/// `|ARROW_HANDLE_RADIUS|` beyond the body ends so the arrow heads stay
/// clear of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowGroup {
    pub body: [f64; 4],
    pub border: [f64; 4],
    pub start_handle: Point,
    pub end_handle: Point,
}

impl ArrowGroup {
    /// Number of drawable primitives in a group.
    pub const PRIMITIVES: usize = 4;

    /// Build an arrow whose visible body spans `points` (`[x1, y1, x2, y2]`).
    pub fn from_span(points: [f64; 4]) -> Self {
        let handles = arrow_connector_points(
            Point::new(points[0], points[1]),
            Point::new(points[2], points[3]),
            ARROW_HANDLE_RADIUS,
        );

        let mut arrow = Self {
            body: points,
            border: points,
            start_handle: Point::new(handles[0], handles[1]),
            end_handle: Point::new(handles[2], handles[3]),
        };
        arrow.update_body();
        arrow
    }

    /// Recompute body and border from the current handle positions.
    pub fn update_body(&mut self) {
        let points = arrow_connector_points(self.start_handle, self.end_handle, ARROW_BODY_RADIUS);
        self.body = points;
        self.border = points;
    }

    /// Move one handle and keep the body attached to it.
    pub fn move_handle(&mut self, part: Part, dx: f64, dy: f64) {
        match part {
            Part::StartHandle => self.start_handle = self.start_handle.offset(dx, dy),
            Part::EndHandle => self.end_handle = self.end_handle.offset(dx, dy),
            Part::Body => return,
        }
        self.update_body();
    }

    fn hit_test(&self, point: Point) -> Option<Part> {
        if point.distance(self.start_handle) <= HANDLE_CIRCLE_RADIUS {
            return Some(Part::StartHandle);
        }
        if point.distance(self.end_handle) <= HANDLE_CIRCLE_RADIUS {
            return Some(Part::EndHandle);
        }

        let from = Point::new(self.body[0], self.body[1]);
        let to = Point::new(self.body[2], self.body[3]);
        let reach = (ARROW_STROKE_WIDTH / 2.0).max(ARROW_POINTER_SIZE / 2.0);
        (distance_to_segment(point, from, to) <= reach).then_some(Part::Body)
    }
}

/// Any object that can sit on a layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneObject {
    GridLine(GridLine),
    MapImage(MapImage),
    Marker(Marker),
    Text(TextLabel),
    Arrow(ArrowGroup),
}

impl SceneObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            SceneObject::GridLine(_) => ObjectKind::GridLine,
            SceneObject::MapImage(_) => ObjectKind::MapImage,
            SceneObject::Marker(_) => ObjectKind::Marker,
            SceneObject::Text(_) => ObjectKind::Text,
            SceneObject::Arrow(_) => ObjectKind::Arrow,
        }
    }

    /// How many drawable primitives this object contributes to its layer.
    pub fn primitive_count(&self) -> usize {
        match self {
            SceneObject::Arrow(_) => ArrowGroup::PRIMITIVES,
            _ => 1,
        }
    }

    /// Top-left position, or the body's first point for arrows.
    pub fn position(&self) -> Point {
        match self {
            SceneObject::GridLine(line) => line.start,
            SceneObject::MapImage(image) => image.position,
            SceneObject::Marker(marker) => marker.position,
            SceneObject::Text(text) => text.position,
            SceneObject::Arrow(arrow) => Point::new(arrow.body[0], arrow.body[1]),
        }
    }

    pub fn set_position(&mut self, position: Point) {
        match self {
            SceneObject::MapImage(image) => image.position = position,
            SceneObject::Marker(marker) => marker.position = position,
            SceneObject::Text(text) => text.position = position,
            SceneObject::GridLine(_) | SceneObject::Arrow(_) => {}
        }
    }

    /// Move a placed object (or one arrow handle) by a delta.
    pub fn translate(&mut self, part: Part, dx: f64, dy: f64) {
        match self {
            SceneObject::Arrow(arrow) => arrow.move_handle(part, dx, dy),
            _ => {
                let position = self.position().offset(dx, dy);
                self.set_position(position);
            }
        }
    }

    /// Image resource backing this object, if any.
    pub fn image_id(&self) -> Option<&str> {
        match self {
            SceneObject::MapImage(image) => Some(&image.image_id),
            SceneObject::Marker(marker) => Some(&marker.image_id),
            _ => None,
        }
    }

    /// Which part of the object, if any, lies under `point` (layer space).
    pub fn hit_test(&self, point: Point) -> Option<Part> {
        let inside = |origin: Point, size: Size| {
            point.x >= origin.x
                && point.x <= origin.x + size.width
                && point.y >= origin.y
                && point.y <= origin.y + size.height
        };

        match self {
            SceneObject::GridLine(_) => None,
            SceneObject::MapImage(image) => inside(image.position, image.size).then_some(Part::Body),
            SceneObject::Marker(marker) => inside(marker.position, MARKER_SIZE).then_some(Part::Body),
            SceneObject::Text(text) => inside(text.position, text.bounds()).then_some(Part::Body),
            SceneObject::Arrow(arrow) => arrow.hit_test(point),
        }
    }
}
