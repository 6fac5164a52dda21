// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Pure helpers for the map canvas: stage/layer coordinate transforms,
//! grid snapping, wheel zoom and the arrow connector math. Nothing in
//! here touches the scene or the UI.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A 2D point in design units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return this point moved by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Width/height pair, used for cell sizes and stage dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned scale followed by a translation.
///
/// `apply` maps a point from the node's own space into its parent's space:
/// `parent = local * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset: Point,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale_x: 1.0,
        scale_y: 1.0,
        offset: Point::ZERO,
    };

    /// Uniform scale plus translation, the only shape the stage produces.
    pub fn uniform(scale: f64, offset: Point) -> Self {
        Self {
            scale_x: scale,
            scale_y: scale,
            offset,
        }
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            point.x * self.scale_x + self.offset.x,
            point.y * self.scale_y + self.offset.y,
        )
    }

    /// Compose with an ancestor: the result applies `self` first, then `parent`.
    pub fn then(&self, parent: &Transform) -> Transform {
        Transform {
            scale_x: self.scale_x * parent.scale_x,
            scale_y: self.scale_y * parent.scale_y,
            offset: parent.apply(self.offset),
        }
    }

    /// Inverse transform. Scales must be non-zero.
    pub fn invert(&self) -> Transform {
        Transform {
            scale_x: 1.0 / self.scale_x,
            scale_y: 1.0 / self.scale_y,
            offset: Point::new(
                -self.offset.x / self.scale_x,
                -self.offset.y / self.scale_y,
            ),
        }
    }
}

/// Convert a pointer position in stage (screen) space into a layer's own
/// coordinate space, given the layer's accumulated absolute transform.
pub fn to_local_coordinates(absolute: &Transform, pointer: Point) -> Point {
    absolute.invert().apply(pointer)
}

/// Snap a position to the grid line at or below it on each axis.
///
/// Uses floor division so negative coordinates land on the cell that
/// contains them (-1 snaps to -cell, not 0).
pub fn snap_to_grid(position: Point, cell: Size) -> Point {
    Point::new(
        (position.x / cell.width).floor() * cell.width,
        (position.y / cell.height).floor() * cell.height,
    )
}

/// New stage scale after one wheel tick.
///
/// Negative `wheel_delta_y` zooms in (multiply), positive zooms out (divide).
/// A zero delta leaves the scale untouched.
pub fn compute_zoom(old_scale: f64, wheel_delta_y: f64, zoom_factor: f64) -> f64 {
    if wheel_delta_y < 0.0 {
        old_scale * zoom_factor
    } else if wheel_delta_y > 0.0 {
        old_scale / zoom_factor
    } else {
        old_scale
    }
}

/// Apply the optional zoom bounds.
pub fn clamp_scale(scale: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let scale = min.map_or(scale, |min| scale.max(min));
    max.map_or(scale, |max| scale.min(max))
}

/// Stage offset that keeps the world point under `pointer` fixed on screen
/// when the scale changes from `old_scale` to `new_scale`.
pub fn compute_zoom_origin(
    pointer: Point,
    old_scale: f64,
    stage_offset: Point,
    new_scale: f64,
) -> Point {
    let world = Point::new(
        pointer.x / old_scale - stage_offset.x / old_scale,
        pointer.y / old_scale - stage_offset.y / old_scale,
    );

    Point::new(
        -(world.x - pointer.x / new_scale) * new_scale,
        -(world.y - pointer.y / new_scale) * new_scale,
    )
}

/// Points offset from two circle centers along the line between them.
///
/// Returns `[p1x, p1y, p2x, p2y]`. A positive `radius` pulls both points
/// towards each other, a negative one pushes them apart. The angle is taken
/// with the y axis flipped, matching the canvas' downward y.
pub fn arrow_connector_points(from: Point, to: Point, radius: f64) -> [f64; 4] {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let angle = (-dy).atan2(dx);

    [
        from.x - radius * (angle + PI).cos(),
        from.y + radius * (angle + PI).sin(),
        to.x - radius * angle.cos(),
        to.y + radius * angle.sin(),
    ]
}

/// Shortest distance from `point` to the segment `a`-`b`.
pub fn distance_to_segment(point: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return point.distance(a);
    }

    let t = (((point.x - a.x) * dx + (point.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    point.distance(Point::new(a.x + t * dx, a.y + t * dy))
}
