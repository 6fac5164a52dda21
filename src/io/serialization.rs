// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Layer document serialization and deserialization.
//!
//! A layer is stored as a Konva-style node tree:
//!
//! ```json
//! {"attrs":{},"className":"Layer","children":[
//!   {"className":"Image","attrs":{"x":790,"y":425,"imageId":"1700000000000"}}
//! ]}
//! ```
//!
//! Every arrow is written as four children (arrow, two circles, stroke)
//! but only the `Arrow`-typed arrow record is read back. Grid lines are
//! never written. Unreadable documents load as empty layers.

use crate::controller::interaction::attach_interaction;
use crate::models::factory::{
    create_arrow, create_map_image, create_text_label, restore_marker, ImageSource,
};
use crate::models::layer::{Layer, LayerKind};
use crate::models::scene::{
    ObjectId, SceneObject, HANDLE_CIRCLE_RADIUS, MARKER_OPACITY, MARKER_SIZE, TEXT_FONT_SIZE, TEXT_WIDTH,
};
use crate::util::geometry::{Point, Size};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const LAYER_CLASS_NAME: &str = "Layer";

/// Top level of a stored layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDocument {
    #[serde(default)]
    pub attrs: Map<String, Value>,
    #[serde(rename = "className", default = "layer_class_name")]
    pub class_name: String,
    #[serde(default)]
    pub children: Vec<Value>,
}

fn layer_class_name() -> String {
    LAYER_CLASS_NAME.to_string()
}

impl LayerDocument {
    pub fn empty() -> Self {
        Self {
            attrs: Map::new(),
            class_name: layer_class_name(),
            children: Vec::new(),
        }
    }
}

/// One stored child node, tagged by its class name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "className", content = "attrs")]
pub enum LayerRecord {
    Image(ImageAttrs),
    Text(TextAttrs),
    Arrow(ArrowAttrs),
    Circle(CircleAttrs),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttrs {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub image_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAttrs {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// Distinguishes the visible arrow from its white border copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowLine {
    Arrow,
    Stroke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowAttrs {
    #[serde(rename = "type")]
    pub line: ArrowLine,
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleAttrs {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Records for every persisted object of a layer, in drawing order.
pub fn layer_records(layer: &Layer) -> Vec<LayerRecord> {
    let mut records = Vec::with_capacity(layer.primitive_count());

    for object in layer.objects() {
        match object {
            SceneObject::GridLine(_) => {}
            SceneObject::MapImage(image) => records.push(LayerRecord::Image(ImageAttrs {
                x: image.position.x,
                y: image.position.y,
                image_id: image.image_id.clone(),
                width: Some(image.size.width),
                height: Some(image.size.height),
                opacity: None,
            })),
            SceneObject::Marker(marker) => records.push(LayerRecord::Image(ImageAttrs {
                x: marker.position.x,
                y: marker.position.y,
                image_id: marker.image_id.clone(),
                width: Some(MARKER_SIZE.width),
                height: Some(MARKER_SIZE.height),
                opacity: Some(MARKER_OPACITY),
            })),
            SceneObject::Text(label) => records.push(LayerRecord::Text(TextAttrs {
                x: label.position.x,
                y: label.position.y,
                text: label.text.clone(),
                font_size: Some(TEXT_FONT_SIZE),
                width: Some(TEXT_WIDTH),
            })),
            SceneObject::Arrow(arrow) => {
                let circle = |center: Point| {
                    LayerRecord::Circle(CircleAttrs {
                        x: center.x,
                        y: center.y,
                        radius: Some(HANDLE_CIRCLE_RADIUS),
                    })
                };
                records.push(LayerRecord::Arrow(ArrowAttrs {
                    line: ArrowLine::Arrow,
                    points: arrow.body.to_vec(),
                }));
                records.push(circle(arrow.start_handle));
                records.push(circle(arrow.end_handle));
                records.push(LayerRecord::Arrow(ArrowAttrs {
                    line: ArrowLine::Stroke,
                    points: arrow.border.to_vec(),
                }));
            }
        }
    }

    records
}

pub fn layer_to_document(layer: &Layer) -> serde_json::Result<LayerDocument> {
    let children = layer_records(layer)
        .iter()
        .map(serde_json::to_value)
        .collect::<serde_json::Result<Vec<_>>>()?;

    Ok(LayerDocument {
        children,
        ..LayerDocument::empty()
    })
}

/// Serialize a whole layer to its stored JSON form.
pub fn layer_to_json(layer: &Layer) -> serde_json::Result<String> {
    serde_json::to_string(&layer_to_document(layer)?)
}

/// JSON of a layer without children, written for new maps.
pub fn empty_document() -> String {
    serde_json::to_string(&LayerDocument::empty()).unwrap_or_else(|_| "{}".to_string())
}

/// Parse a stored layer, falling back to an empty document.
pub fn parse_document(json: &str, kind: LayerKind) -> LayerDocument {
    match serde_json::from_str(json) {
        Ok(document) => document,
        Err(e) => {
            log::warn!("Malformed {} layer document, loading it empty: {}", kind, e);
            LayerDocument::empty()
        }
    }
}

/// Typed records of a document. Children that do not match a known record
/// are skipped.
pub fn document_records(document: &LayerDocument) -> Vec<LayerRecord> {
    document
        .children
        .iter()
        .filter_map(|child| match LayerRecord::deserialize(child) {
            Ok(record) => Some(record),
            Err(e) => {
                let class_name = child.get("className").and_then(Value::as_str).unwrap_or("?");
                log::warn!("Skipping unreadable {} node: {}", class_name, e);
                None
            }
        })
        .collect()
}

/// What rebuilding a layer needs besides the document itself.
#[derive(Clone, Copy)]
pub struct LoadContext<'a> {
    pub source: ImageSource<'a>,
    pub cell_size: Size,
}

/// Rebuild a live layer, with interactions attached, from a stored document.
///
/// `None` (no document yet) and malformed documents both give an empty layer.
pub fn load_layer(kind: LayerKind, json: Option<&str>, context: LoadContext<'_>) -> Layer {
    let mut layer = Layer::new(kind);
    let Some(json) = json else {
        return layer;
    };

    let document = parse_document(json, kind);
    let mut open_arrow = None;
    for record in document_records(&document) {
        if let (LayerKind::Marker, LayerRecord::Circle(circle)) = (kind, &record) {
            open_arrow = restore_handle(&mut layer, open_arrow, Point::new(circle.x, circle.y));
            continue;
        }

        let arrow_body = matches!(&record, LayerRecord::Arrow(attrs) if attrs.line == ArrowLine::Arrow);
        let id = match (kind, record) {
            (LayerKind::Map, LayerRecord::Image(attrs)) => create_map_image(
                &attrs.image_id,
                Point::new(attrs.x, attrs.y),
                context.cell_size,
                &mut layer,
                context.source,
            ),
            (LayerKind::Marker, LayerRecord::Image(attrs)) => restore_marker(
                &attrs.image_id,
                Point::new(attrs.x, attrs.y),
                &mut layer,
                context.source,
            ),
            (LayerKind::Marker, LayerRecord::Text(attrs)) => {
                create_text_label(&attrs.text, Point::new(attrs.x, attrs.y), &mut layer)
            }
            (LayerKind::Marker, LayerRecord::Arrow(attrs)) if attrs.line == ArrowLine::Arrow => {
                match attrs.points.as_slice() {
                    [x1, y1, x2, y2, ..] => Some(create_arrow([*x1, *y1, *x2, *y2], &mut layer)),
                    _ => {
                        log::warn!("Skipping arrow with {} points", attrs.points.len());
                        None
                    }
                }
            }
            // stroke copies are rebuilt from the arrow record
            _ => None,
        };

        open_arrow = id.filter(|_| arrow_body).map(|id| (id, None));
        if let Some(id) = id {
            attach_interaction(&mut layer, id, context.cell_size);
        }
    }

    log::debug!("Loaded {} layer with {} objects", kind, layer.len());
    layer
}

/// Arrow still collecting its handle circles, with the start handle once seen.
type OpenArrow = Option<(ObjectId, Option<Point>)>;

/// The two circles after an arrow record are its start and end handles.
fn restore_handle(layer: &mut Layer, open: OpenArrow, center: Point) -> OpenArrow {
    match open {
        Some((id, None)) => Some((id, Some(center))),
        Some((id, Some(start))) => {
            if let Some(SceneObject::Arrow(arrow)) = layer.node_mut(id).map(|node| &mut node.object) {
                arrow.start_handle = start;
                arrow.end_handle = center;
                arrow.update_body();
            }
            None
        }
        None => {
            log::debug!("Ignoring a handle circle outside an arrow group");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::resources::StubResources;
    use crate::models::factory::{create_marker, default_arrow_span};
    use crate::models::scene::{ObjectKind, Part};

    const CELL: Size = Size {
        width: 790.0,
        height: 425.0,
    };

    fn context(resources: &StubResources) -> LoadContext<'_> {
        LoadContext {
            source: ImageSource {
                resources,
                map_name: "base",
            },
            cell_size: CELL,
        }
    }

    /// (kind, position, kind specific field) tuples used to compare layers.
    fn summary(layer: &Layer) -> Vec<(ObjectKind, Point, String)> {
        layer
            .objects()
            .map(|object| {
                let detail = match object {
                    SceneObject::MapImage(image) => image.image_id.clone(),
                    SceneObject::Marker(marker) => marker.image_id.clone(),
                    SceneObject::Text(label) => label.text.clone(),
                    SceneObject::Arrow(arrow) => format!(
                        "{:.3},{:.3},{:.3},{:.3}",
                        arrow.body[0], arrow.body[1], arrow.body[2], arrow.body[3]
                    ),
                    SceneObject::GridLine(_) => String::new(),
                };
                let position = object.position();
                let rounded = Point::new(
                    (position.x * 1000.0).round() / 1000.0,
                    (position.y * 1000.0).round() / 1000.0,
                );
                (object.kind(), rounded, detail)
            })
            .collect()
    }

    fn sample_marker_layer(resources: &StubResources) -> Layer {
        let source = context(resources).source;
        let mut layer = Layer::new(LayerKind::Marker);
        create_marker("tank", Point::new(135.0, 135.0), &mut layer, source);
        create_text_label("Bridge out", Point::new(-40.0, 12.5), &mut layer);
        create_arrow(default_arrow_span(Point::new(500.0, 500.0)), &mut layer);
        create_arrow([10.0, 10.0, -300.0, 720.0], &mut layer);
        layer
    }

    #[test]
    fn test_marker_layer_round_trip() {
        let resources = StubResources;
        let layer = sample_marker_layer(&resources);
        let json = layer_to_json(&layer).unwrap();

        let restored = load_layer(LayerKind::Marker, Some(&json), context(&resources));
        assert_eq!(summary(&restored), summary(&layer));
        assert_eq!(restored.primitive_count(), layer.primitive_count());
        assert!(restored.nodes().all(|node| node.interaction.is_some()));
    }

    #[test]
    fn test_map_layer_round_trip() {
        let resources = StubResources;
        let source = context(&resources).source;
        let mut layer = Layer::new(LayerKind::Map);
        create_map_image("1700", Point::new(790.0, 425.0), CELL, &mut layer, source);
        create_map_image("1800", Point::new(-790.0, 0.0), CELL, &mut layer, source);

        let json = layer_to_json(&layer).unwrap();
        let restored = load_layer(LayerKind::Map, Some(&json), context(&resources));
        assert_eq!(summary(&restored), summary(&layer));
    }

    #[test]
    fn test_arrow_writes_four_records_reads_one() {
        let resources = StubResources;
        let mut layer = Layer::new(LayerKind::Marker);
        create_arrow([300.0, 500.0, 700.0, 500.0], &mut layer);

        let records = layer_records(&layer);
        assert_eq!(records.len(), 4);
        assert!(matches!(
            &records[3],
            LayerRecord::Arrow(ArrowAttrs { line: ArrowLine::Stroke, .. })
        ));

        let json = layer_to_json(&layer).unwrap();
        let restored = load_layer(LayerKind::Marker, Some(&json), context(&resources));
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_crossed_arrow_handles_survive_reload() {
        let resources = StubResources;
        let mut layer = Layer::new(LayerKind::Marker);
        let id = create_arrow(default_arrow_span(Point::new(500.0, 500.0)), &mut layer);
        if let Some(SceneObject::Arrow(arrow)) = layer.node_mut(id).map(|node| &mut node.object) {
            arrow.move_handle(Part::EndHandle, -460.0, 0.0);
        }
        let (start, end) = match layer.get(id) {
            Some(SceneObject::Arrow(arrow)) => (arrow.start_handle, arrow.end_handle),
            other => panic!("expected an arrow, got {other:?}"),
        };
        assert!((end.x - start.x).abs() < 100.0);

        let json = layer_to_json(&layer).unwrap();
        let restored = load_layer(LayerKind::Marker, Some(&json), context(&resources));
        assert_eq!(restored.len(), 1);
        match restored.objects().next() {
            Some(SceneObject::Arrow(arrow)) => {
                assert!(arrow.start_handle.distance(start) < 1e-9);
                assert!(arrow.end_handle.distance(end) < 1e-9);
            }
            other => panic!("expected an arrow, got {other:?}"),
        };
    }

    #[test]
    fn test_stray_circles_do_not_create_objects() {
        let resources = StubResources;
        let json = r#"{"attrs":{},"className":"Layer","children":[
            {"className":"Circle","attrs":{"x":5,"y":5,"radius":50}},
            {"className":"Text","attrs":{"x":0,"y":0,"text":"HQ"}},
            {"className":"Circle","attrs":{"x":9,"y":9}}
        ]}"#;
        let restored = load_layer(LayerKind::Marker, Some(json), context(&resources));
        assert_eq!(summary(&restored), vec![(ObjectKind::Text, Point::ZERO, "HQ".to_string())]);
    }

    #[test]
    fn test_grid_lines_are_not_written() {
        let grid = Layer::grid(7, 7, CELL);
        assert!(layer_records(&grid).is_empty());
    }

    #[test]
    fn test_document_shape_matches_node_tree() {
        let mut layer = Layer::new(LayerKind::Marker);
        create_text_label("HQ", Point::new(1.0, 2.0), &mut layer);

        let value: Value = serde_json::from_str(&layer_to_json(&layer).unwrap()).unwrap();
        assert_eq!(value["className"], "Layer");
        assert_eq!(value["children"][0]["className"], "Text");
        assert_eq!(value["children"][0]["attrs"]["text"], "HQ");
        assert_eq!(value["children"][0]["attrs"]["x"], 1.0);
    }

    #[test]
    fn test_reads_konva_document_with_defaults() {
        let resources = StubResources;
        // Konva omits zero coordinates and writes extra attributes
        let json = r#"{"attrs":{},"className":"Layer","children":[
            {"attrs":{"width":70,"height":70,"imageId":"flag","opacity":0.8,"draggable":true},"className":"Image"},
            {"attrs":{"type":"Arrow","points":[0,0,100,0],"fill":"black"},"className":"Arrow"},
            {"attrs":{"x":-50,"radius":30},"className":"Circle"},
            {"attrs":{"x":150,"radius":30},"className":"Circle"},
            {"attrs":{"type":"Stroke","points":[0,0,100,0]},"className":"Arrow"}
        ]}"#;

        let layer = load_layer(LayerKind::Marker, Some(json), context(&resources));
        let kinds: Vec<ObjectKind> = layer.objects().map(SceneObject::kind).collect();
        assert_eq!(kinds, vec![ObjectKind::Marker, ObjectKind::Arrow]);
        assert_eq!(layer.objects().next().map(SceneObject::position), Some(Point::ZERO));
    }

    #[test]
    fn test_unknown_and_broken_children_are_skipped() {
        let resources = StubResources;
        let json = r#"{"className":"Layer","children":[
            {"className":"Star","attrs":{"x":1}},
            {"className":"Text","attrs":{"x":5}},
            {"className":"Arrow","attrs":{"type":"Arrow","points":[1,2]}},
            {"className":"Text","attrs":{"x":5,"y":6,"text":"kept"}}
        ]}"#;

        let layer = load_layer(LayerKind::Marker, Some(json), context(&resources));
        assert_eq!(layer.len(), 1);
        assert_eq!(summary(&layer)[0].2, "kept");
    }

    #[test]
    fn test_malformed_documents_load_empty() {
        let resources = StubResources;
        for json in ["", "not json", "[]", "{\"children\": 5}"] {
            let layer = load_layer(LayerKind::Map, Some(json), context(&resources));
            assert!(layer.is_empty(), "{json:?} should load empty");
        }
        assert!(load_layer(LayerKind::Marker, None, context(&resources)).is_empty());
    }

    #[test]
    fn test_map_layer_ignores_marker_records() {
        let resources = StubResources;
        let json = r#"{"className":"Layer","children":[
            {"className":"Text","attrs":{"text":"stray"}},
            {"className":"Image","attrs":{"x":790,"y":425,"imageId":"1700"}}
        ]}"#;

        let layer = load_layer(LayerKind::Map, Some(json), context(&resources));
        assert_eq!(summary(&layer), vec![(ObjectKind::MapImage, Point::new(790.0, 425.0), "1700".to_string())]);
    }

    #[test]
    fn test_empty_document_parses_to_empty_layer() {
        let document = parse_document(&empty_document(), LayerKind::Map);
        assert_eq!(document, LayerDocument::empty());
    }
}
