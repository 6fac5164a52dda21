// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene object factories.
//!
//! Every factory places a new object on the given layer and returns its id.
//! Object sizes are fixed per kind, so placement never waits for an image
//! to decode; drawing picks the texture up once it is ready.

use super::layer::Layer;
use super::scene::{
    ArrowGroup, MapImage, Marker, ObjectId, SceneObject, TextLabel, ARROW_HALF_LENGTH,
    MARKER_SIZE,
};
use crate::io::resources::ResourceProvider;
use crate::util::geometry::{Point, Size};

/// Where image-backed objects look up their files.
#[derive(Clone, Copy)]
pub struct ImageSource<'a> {
    pub resources: &'a dyn ResourceProvider,
    pub map_name: &'a str,
}

/// Place a screenshot filling one grid cell with its top-left at `position`.
///
/// Returns `None` (and logs) when the screenshot file does not exist.
pub fn create_map_image(
    image_id: &str,
    position: Point,
    cell_size: Size,
    layer: &mut Layer,
    source: ImageSource<'_>,
) -> Option<ObjectId> {
    let path = source.resources.map_image_path(source.map_name, image_id);
    if !source.resources.path_exists(&path) {
        log::warn!("Map image not found, not placing it: {}", path.display());
        return None;
    }

    let id = layer.add(SceneObject::MapImage(MapImage {
        image_id: image_id.to_string(),
        position,
        size: cell_size,
    }));
    log::debug!("Placed map image {} at ({:.0}, {:.0})", image_id, position.x, position.y);
    Some(id)
}

/// Place a marker icon centered on `position`.
pub fn create_marker(
    image_id: &str,
    position: Point,
    layer: &mut Layer,
    source: ImageSource<'_>,
) -> Option<ObjectId> {
    let path = source.resources.icon_path(image_id);
    if !source.resources.path_exists(&path) {
        log::warn!("Marker icon not found, not placing it: {}", path.display());
        return None;
    }

    let position = position.offset(-MARKER_SIZE.width / 2.0, -MARKER_SIZE.height / 2.0);
    Some(place_marker(image_id, position, layer))
}

/// Re-create a stored marker at its saved top-left corner.
pub fn restore_marker(
    image_id: &str,
    position: Point,
    layer: &mut Layer,
    source: ImageSource<'_>,
) -> Option<ObjectId> {
    let path = source.resources.icon_path(image_id);
    if !source.resources.path_exists(&path) {
        log::warn!("Marker icon not found, skipping stored marker: {}", path.display());
        return None;
    }

    Some(place_marker(image_id, position, layer))
}

fn place_marker(image_id: &str, position: Point, layer: &mut Layer) -> ObjectId {
    layer.add(SceneObject::Marker(Marker {
        image_id: image_id.to_string(),
        position,
    }))
}

/// Place a text label. Blank text never creates a label.
pub fn create_text_label(text: &str, position: Point, layer: &mut Layer) -> Option<ObjectId> {
    if text.trim().is_empty() {
        return None;
    }

    Some(layer.add(SceneObject::Text(TextLabel {
        text: text.to_string(),
        position,
    })))
}

/// Place an arrow whose visible body spans `points`.
pub fn create_arrow(points: [f64; 4], layer: &mut Layer) -> ObjectId {
    layer.add(SceneObject::Arrow(ArrowGroup::from_span(points)))
}

/// Horizontal span centered on a drop point.
pub fn default_arrow_span(center: Point) -> [f64; 4] {
    [
        center.x - ARROW_HALF_LENGTH,
        center.y,
        center.x + ARROW_HALF_LENGTH,
        center.y,
    ]
}
