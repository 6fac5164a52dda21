// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stage controller.
//!
//! Owns the viewport (zoom, pan, display size) and the three layers of the
//! active map. UI code turns raw input into calls on this type; every
//! mutation that must be persisted is reported as a `StageEvent`.

use super::interaction::{attach_interaction, Confirm, CursorStyle, ObjectEvent, Outcome, PointerButton};
use crate::config::{Settings, ZoomSettings};
use crate::io::repository::MapRepository;
use crate::io::resources::{file_name_of, ResourceProvider};
use crate::io::serialization::{layer_to_json, load_layer, LoadContext};
use crate::models::factory::{
    create_arrow, create_map_image, create_marker, create_text_label, default_arrow_span,
    ImageSource,
};
use crate::models::layer::{Layer, LayerKind, SceneNode};
use crate::models::map::MapDocuments;
use crate::models::scene::{ObjectId, Part, SceneObject};
use crate::util::geometry::{
    clamp_scale, compute_zoom, compute_zoom_origin, snap_to_grid, to_local_coordinates, Point,
    Size, Transform,
};

/// Kind of palette item being dragged onto the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Image,
    Icon,
    Text,
    Arrow,
}

/// Pending palette drag: its kind plus the path of the screenshot or icon
/// it refers to (empty for text and arrows).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragItem {
    pub kind: DragKind,
    pub source: String,
}

/// Notifications for the persistence listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    LayerChanged(LayerKind),
    /// A map finished loading into the stage.
    Loaded(String),
}

/// An object on one of the editable layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectTarget {
    pub layer: LayerKind,
    pub id: ObjectId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropResult {
    pub kind: DragKind,
    pub placed: Option<ObjectId>,
}

pub struct StageController {
    scale: f64,
    offset: Point,
    logical_size: Size,
    display_size: Size,
    draggable: bool,
    zoom: ZoomSettings,
    cell_size: Size,
    grid_layer: Layer,
    map_layer: Layer,
    marker_layer: Layer,
    drag_item: Option<DragItem>,
    active_map: Option<String>,
    cursor: CursorStyle,
    events: Vec<StageEvent>,
}

impl StageController {
    pub fn new(settings: &Settings) -> Self {
        let cell_size = settings.grid.cell_size();
        Self {
            scale: settings.stage.initial_scale,
            offset: Point::ZERO,
            logical_size: settings.stage.size(),
            display_size: settings.stage.size(),
            draggable: false,
            zoom: settings.zoom,
            cell_size,
            grid_layer: Layer::grid(settings.grid.rows, settings.grid.cols, cell_size),
            map_layer: Layer::new(LayerKind::Map),
            marker_layer: Layer::new(LayerKind::Marker),
            drag_item: None,
            active_map: None,
            cursor: CursorStyle::Default,
            events: Vec::new(),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    /// On-screen size of the stage box.
    pub fn display_size(&self) -> Size {
        self.display_size
    }

    /// Whether a drag on empty stage pans the view.
    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn active_map(&self) -> Option<&str> {
        self.active_map.as_deref()
    }

    /// Stage transform: design units to stage (screen) space.
    pub fn transform(&self) -> Transform {
        Transform::uniform(self.scale, self.offset)
    }

    /// Layers bottom to top.
    pub fn layers(&self) -> [&Layer; 3] {
        [&self.grid_layer, &self.map_layer, &self.marker_layer]
    }

    pub fn layer(&self, kind: LayerKind) -> &Layer {
        match kind {
            LayerKind::Grid => &self.grid_layer,
            LayerKind::Map => &self.map_layer,
            LayerKind::Marker => &self.marker_layer,
        }
    }

    fn layer_mut(&mut self, kind: LayerKind) -> &mut Layer {
        match kind {
            LayerKind::Grid => &mut self.grid_layer,
            LayerKind::Map => &mut self.map_layer,
            LayerKind::Marker => &mut self.marker_layer,
        }
    }

    /// Accumulated transform of a layer under the stage.
    pub fn layer_transform(&self, kind: LayerKind) -> Transform {
        self.layer(kind).transform().then(&self.transform())
    }

    /// Pointer (stage space) in a layer's own coordinates.
    pub fn to_layer(&self, kind: LayerKind, pointer: Point) -> Point {
        to_local_coordinates(&self.layer_transform(kind), pointer)
    }

    /// Fit the stage box to the container width, keeping its aspect ratio.
    pub fn resize(&mut self, container_width: f64) {
        if container_width <= 0.0 || self.logical_size.width <= 0.0 {
            return;
        }
        let fit = container_width / self.logical_size.width;
        self.display_size = Size::new(self.logical_size.width * fit, self.logical_size.height * fit);
    }

    /// Zoom one wheel step around the pointer. Scale and offset change
    /// together.
    pub fn wheel(&mut self, pointer: Point, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }

        let old_scale = self.scale;
        let new_scale = clamp_scale(
            compute_zoom(old_scale, delta_y, self.zoom.factor),
            self.zoom.min_scale,
            self.zoom.max_scale,
        );
        if new_scale == old_scale {
            return;
        }

        self.offset = compute_zoom_origin(pointer, old_scale, self.offset, new_scale);
        self.scale = new_scale;
    }

    /// A press on the stage. Only the middle button enables panning.
    pub fn pointer_down(&mut self, button: PointerButton) {
        self.draggable = button == PointerButton::Middle;
    }

    /// Move the view by a screen-space delta, if panning is enabled.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        if !self.draggable {
            return false;
        }
        self.offset = self.offset.offset(dx, dy);
        true
    }

    /// Remember what the user started dragging from a palette.
    pub fn begin_drag(&mut self, kind: DragKind, source: impl Into<String>) {
        self.drag_item = Some(DragItem {
            kind,
            source: source.into(),
        });
    }

    pub fn cancel_drag(&mut self) {
        if self.drag_item.take().is_some() {
            log::debug!("Palette drag cancelled");
        }
    }

    pub fn pending_drag(&self) -> Option<&DragItem> {
        self.drag_item.as_ref()
    }

    /// Place the pending drag item at `pointer` (stage space).
    ///
    /// `text` is the live text input, used for text drops. Returns `None`
    /// when nothing was pending or no map is active.
    pub fn drop_at(
        &mut self,
        pointer: Point,
        text: &str,
        resources: &dyn ResourceProvider,
    ) -> Option<DropResult> {
        let item = self.drag_item.take()?;
        let Some(map_name) = self.active_map.as_deref() else {
            log::warn!("Dropped a {:?} with no map selected, ignoring", item.kind);
            return None;
        };

        let source = ImageSource {
            resources,
            map_name,
        };
        let (layer_kind, placed) = match item.kind {
            DragKind::Image => {
                let local = self.to_layer(LayerKind::Map, pointer);
                let position = snap_to_grid(local, self.cell_size);
                let id = create_map_image(
                    &file_name_of(&item.source),
                    position,
                    self.cell_size,
                    &mut self.map_layer,
                    source,
                );
                (LayerKind::Map, id)
            }
            DragKind::Icon => {
                let local = self.to_layer(LayerKind::Marker, pointer);
                let id = create_marker(&file_name_of(&item.source), local, &mut self.marker_layer, source);
                (LayerKind::Marker, id)
            }
            DragKind::Text => {
                let local = self.to_layer(LayerKind::Marker, pointer);
                (LayerKind::Marker, create_text_label(text, local, &mut self.marker_layer))
            }
            DragKind::Arrow => {
                let local = self.to_layer(LayerKind::Marker, pointer);
                let id = create_arrow(default_arrow_span(local), &mut self.marker_layer);
                (LayerKind::Marker, Some(id))
            }
        };

        if let Some(id) = placed {
            let cell_size = self.cell_size;
            attach_interaction(self.layer_mut(layer_kind), id, cell_size);
            log::info!("Placed {:?} on the {} layer", item.kind, layer_kind);
            self.events.push(StageEvent::LayerChanged(layer_kind));
        }

        Some(DropResult {
            kind: item.kind,
            placed,
        })
    }

    /// Topmost interactive object under `pointer` (stage space). Objects
    /// rejected by `visible` cannot be hit.
    pub fn hit_test(
        &self,
        pointer: Point,
        visible: &dyn Fn(&SceneObject) -> bool,
    ) -> Option<(ObjectTarget, Part)> {
        [LayerKind::Marker, LayerKind::Map].into_iter().find_map(|kind| {
            let local = self.to_layer(kind, pointer);
            self.layer(kind)
                .hit_test(local, visible)
                .map(|(id, part)| (ObjectTarget { layer: kind, id }, part))
        })
    }

    /// Route a pointer event to one object's interaction.
    pub fn object_event(
        &mut self,
        target: ObjectTarget,
        part: Part,
        event: ObjectEvent,
        confirm: &mut dyn Confirm,
    ) -> Outcome {
        let layer = self.layer_mut(target.layer);
        let Some(SceneNode {
            object,
            interaction: Some(interaction),
            ..
        }) = layer.node_mut(target.id)
        else {
            return Outcome::Ignored;
        };

        let outcome = interaction.handle(part, event, object, confirm);
        match outcome {
            Outcome::Deleted => {
                if let Some(removed) = layer.remove(target.id) {
                    log::info!("Deleted {} from the {} layer", removed.kind().label(), target.layer);
                }
                self.cursor = CursorStyle::Default;
                self.events.push(StageEvent::LayerChanged(target.layer));
            }
            Outcome::Committed => self.events.push(StageEvent::LayerChanged(target.layer)),
            Outcome::Cursor(style) => self.cursor = style,
            Outcome::Ignored | Outcome::Grabbed | Outcome::Cancelled | Outcome::Moved => {}
        }
        outcome
    }

    /// Replace both editable layers with a stored map.
    pub fn switch_map(&mut self, name: &str, documents: &MapDocuments, resources: &dyn ResourceProvider) {
        let context = LoadContext {
            source: ImageSource {
                resources,
                map_name: name,
            },
            cell_size: self.cell_size,
        };

        self.map_layer = load_layer(LayerKind::Map, Some(&documents.image_layer), context);
        self.marker_layer = load_layer(LayerKind::Marker, documents.marker_layer.as_deref(), context);
        self.active_map = Some(name.to_string());
        self.drag_item = None;
        self.cursor = CursorStyle::Default;

        log::info!(
            "Switched to map '{}' ({} images, {} markers)",
            name,
            self.map_layer.len(),
            self.marker_layer.len()
        );
        self.events.push(StageEvent::Loaded(name.to_string()));
    }

    /// Empty the stage when no map is selected.
    pub fn clear_map(&mut self) {
        self.map_layer = Layer::new(LayerKind::Map);
        self.marker_layer = Layer::new(LayerKind::Marker);
        self.active_map = None;
        self.drag_item = None;
        self.cursor = CursorStyle::Default;
    }

    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.events)
    }

    /// Serialize one layer and write it to the active map.
    ///
    /// Failures are logged; the in-memory scene stays as it is.
    pub fn save_layer(&self, kind: LayerKind, repository: &mut dyn MapRepository) -> bool {
        let Some(name) = self.active_map.as_deref() else {
            log::warn!("No active map, not saving the {} layer", kind);
            return false;
        };

        let document = match layer_to_json(self.layer(kind)) {
            Ok(document) => document,
            Err(e) => {
                log::error!("Failed to serialize the {} layer of '{}': {}", kind, name, e);
                return false;
            }
        };

        let result = match kind {
            LayerKind::Map => repository.update_map_image_layer(name, &document),
            LayerKind::Marker => repository.update_map_marker_layer(name, &document),
            LayerKind::Grid => return false,
        };

        match result {
            Ok(()) => {
                log::debug!("Saved the {} layer of '{}'", kind, name);
                true
            }
            Err(e) => {
                log::error!("Failed to save the {} layer of '{}': {}", kind, name, e);
                false
            }
        }
    }

    /// Write every changed layer, one write per change, and return the
    /// events that are not persistence work.
    pub fn persist_changes(&mut self, repository: &mut dyn MapRepository) -> Vec<StageEvent> {
        let mut remaining = Vec::new();
        for event in self.drain_events() {
            match event {
                StageEvent::LayerChanged(kind) => {
                    self.save_layer(kind, repository);
                }
                other => remaining.push(other),
            }
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::interaction::testing::ScriptedConfirm;
    use crate::io::repository::MemoryMapRepository;
    use crate::io::resources::StubResources;
    use crate::io::serialization::empty_document;
    use crate::models::scene::ObjectKind;

    fn stage_with_map(repository: &mut MemoryMapRepository) -> StageController {
        let mut stage = StageController::new(&Settings::default());
        repository.create_map("base").unwrap();
        let documents = repository.get_map("base").unwrap();
        stage.switch_map("base", &documents, &StubResources);
        stage.drain_events();
        stage
    }

    /// Stage-space pointer for a point in design units.
    fn screen(stage: &StageController, x: f64, y: f64) -> Point {
        stage.transform().apply(Point::new(x, y))
    }

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-6
    }

    #[test]
    fn test_image_drop_snaps_to_cell_and_persists() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);

        stage.begin_drag(DragKind::Image, "screenshots/map/base/1700.png");
        let pointer = screen(&stage, 1200.0, 450.0);
        let result = stage.drop_at(pointer, "", &StubResources).unwrap();

        let id = result.placed.unwrap();
        let image = stage.layer(LayerKind::Map).get(id).unwrap();
        assert_eq!(image.position(), Point::new(790.0, 425.0));
        assert_eq!(image.image_id(), Some("1700"));
        assert!(stage.pending_drag().is_none());

        let remaining = stage.persist_changes(&mut repository);
        assert!(remaining.is_empty());
        assert_eq!(repository.writes, 1);
        assert!(repository.get_map("base").unwrap().image_layer.contains("\"imageId\":\"1700\""));
    }

    #[test]
    fn test_wheel_zooms_around_pointer() {
        let mut stage = StageController::new(&Settings::default());
        let pointer = Point::new(300.0, 200.0);
        let world_before = stage.to_layer(LayerKind::Map, pointer);

        stage.wheel(pointer, -120.0);
        assert!((stage.scale() - 0.132).abs() < 1e-12);
        assert!(close(stage.to_layer(LayerKind::Map, pointer), world_before));

        stage.wheel(pointer, 120.0);
        assert!((stage.scale() - 0.12).abs() < 1e-12);
        assert!(close(stage.to_layer(LayerKind::Map, pointer), world_before));
    }

    #[test]
    fn test_wheel_respects_bounds_and_zero_delta() {
        let mut settings = Settings::default();
        settings.zoom.max_scale = Some(0.125);
        let mut stage = StageController::new(&settings);

        stage.wheel(Point::new(10.0, 10.0), 0.0);
        assert_eq!(stage.scale(), 0.12);

        stage.wheel(Point::new(10.0, 10.0), -1.0);
        stage.wheel(Point::new(10.0, 10.0), -1.0);
        assert_eq!(stage.scale(), 0.125);
    }

    #[test]
    fn test_arrow_drop_uses_default_span() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);

        stage.begin_drag(DragKind::Arrow, "");
        let pointer = screen(&stage, 500.0, 500.0);
        let id = stage.drop_at(pointer, "", &StubResources).unwrap().placed.unwrap();

        match stage.layer(LayerKind::Marker).get(id) {
            Some(SceneObject::Arrow(arrow)) => {
                let expected = [300.0, 500.0, 700.0, 500.0];
                for (actual, expected) in arrow.body.iter().zip(expected) {
                    assert!((actual - expected).abs() < 1e-6);
                }
                assert!(close(arrow.start_handle, Point::new(250.0, 500.0)));
                assert!(close(arrow.end_handle, Point::new(750.0, 500.0)));
            }
            other => panic!("expected an arrow, got {other:?}"),
        }
        assert_eq!(stage.layer(LayerKind::Marker).primitive_count(), 4);
    }

    #[test]
    fn test_declined_delete_keeps_marker_and_skips_write() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);

        stage.begin_drag(DragKind::Icon, "icons/tank.svg");
        let id = stage
            .drop_at(screen(&stage, 100.0, 100.0), "", &StubResources)
            .unwrap()
            .placed
            .unwrap();
        stage.persist_changes(&mut repository);
        let writes = repository.writes;

        let target = ObjectTarget {
            layer: LayerKind::Marker,
            id,
        };
        let mut confirm = ScriptedConfirm::answering(false);
        let outcome = stage.object_event(
            target,
            Part::Body,
            ObjectEvent::PointerDown(PointerButton::Secondary),
            &mut confirm,
        );

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(confirm.prompts, vec!["Delete marker?".to_string()]);
        assert!(stage.layer(LayerKind::Marker).get(id).is_some());
        stage.persist_changes(&mut repository);
        assert_eq!(repository.writes, writes);
    }

    #[test]
    fn test_confirmed_arrow_delete_removes_all_primitives() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);

        stage.begin_drag(DragKind::Arrow, "");
        let id = stage
            .drop_at(screen(&stage, 500.0, 500.0), "", &StubResources)
            .unwrap()
            .placed
            .unwrap();
        stage.drain_events();

        let mut confirm = ScriptedConfirm::answering(true);
        let target = ObjectTarget {
            layer: LayerKind::Marker,
            id,
        };
        let outcome = stage.object_event(
            target,
            Part::StartHandle,
            ObjectEvent::PointerDown(PointerButton::Secondary),
            &mut confirm,
        );

        assert_eq!(outcome, Outcome::Deleted);
        assert_eq!(stage.layer(LayerKind::Marker).primitive_count(), 0);
        assert_eq!(stage.drain_events(), vec![StageEvent::LayerChanged(LayerKind::Marker)]);
    }

    #[test]
    fn test_text_drop_needs_text() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);

        stage.begin_drag(DragKind::Text, "");
        let result = stage.drop_at(Point::new(10.0, 10.0), "   ", &StubResources).unwrap();
        assert_eq!(result.kind, DragKind::Text);
        assert_eq!(result.placed, None);
        assert!(stage.layer(LayerKind::Marker).is_empty());
        assert!(stage.drain_events().is_empty());

        stage.begin_drag(DragKind::Text, "");
        let result = stage.drop_at(Point::new(10.0, 10.0), "Bridge", &StubResources).unwrap();
        assert!(result.placed.is_some());
    }

    #[test]
    fn test_drop_without_map_or_item_is_ignored() {
        let mut stage = StageController::new(&Settings::default());
        assert!(stage.drop_at(Point::ZERO, "", &StubResources).is_none());

        stage.begin_drag(DragKind::Arrow, "");
        assert!(stage.drop_at(Point::ZERO, "", &StubResources).is_none());
        assert!(stage.pending_drag().is_none());
        assert!(stage.layer(LayerKind::Marker).is_empty());
    }

    #[test]
    fn test_map_image_drag_end_snaps_and_commits() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);
        stage.begin_drag(DragKind::Image, "1700");
        let id = stage
            .drop_at(screen(&stage, 10.0, 10.0), "", &StubResources)
            .unwrap()
            .placed
            .unwrap();
        stage.drain_events();

        let target = ObjectTarget {
            layer: LayerKind::Map,
            id,
        };
        let mut confirm = ScriptedConfirm::default();
        for event in [
            ObjectEvent::PointerDown(PointerButton::Primary),
            ObjectEvent::DragStart { middle_held: false },
            ObjectEvent::DragMove { dx: 800.0, dy: 0.0 },
        ] {
            stage.object_event(target, Part::Body, event, &mut confirm);
        }
        assert!(stage.drain_events().is_empty());

        let outcome = stage.object_event(
            target,
            Part::Body,
            ObjectEvent::DragEnd {
                pointer: Some(Point::new(1650.0, 30.0)),
            },
            &mut confirm,
        );
        assert_eq!(outcome, Outcome::Committed);
        assert_eq!(stage.layer(LayerKind::Map).get(id).map(SceneObject::position), Some(Point::new(1580.0, 0.0)));
        assert_eq!(stage.drain_events(), vec![StageEvent::LayerChanged(LayerKind::Map)]);
    }

    #[test]
    fn test_switch_map_rebuilds_layers_in_order() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);
        stage.begin_drag(DragKind::Icon, "flag");
        stage.drop_at(screen(&stage, 300.0, 300.0), "", &StubResources);
        stage.persist_changes(&mut repository);

        repository.create_map("other").unwrap();
        stage.switch_map("other", &repository.get_map("other").unwrap(), &StubResources);
        assert!(stage.layer(LayerKind::Marker).is_empty());
        assert_eq!(stage.drain_events(), vec![StageEvent::Loaded("other".to_string())]);

        stage.switch_map("base", &repository.get_map("base").unwrap(), &StubResources);
        let kinds: Vec<LayerKind> = stage.layers().iter().map(|layer| layer.kind()).collect();
        assert_eq!(kinds, vec![LayerKind::Grid, LayerKind::Map, LayerKind::Marker]);
        assert_eq!(stage.layer(LayerKind::Grid).len(), 16);
        let markers: Vec<ObjectKind> = stage.layer(LayerKind::Marker).objects().map(SceneObject::kind).collect();
        assert_eq!(markers, vec![ObjectKind::Marker]);
        assert!(stage.layer(LayerKind::Marker).nodes().all(|node| node.interaction.is_some()));
    }

    #[test]
    fn test_malformed_map_loads_empty() {
        let mut stage = StageController::new(&Settings::default());
        let documents = MapDocuments {
            image_layer: "{broken".to_string(),
            marker_layer: Some(empty_document()),
        };
        stage.switch_map("broken", &documents, &StubResources);
        assert!(stage.layer(LayerKind::Map).is_empty());
        assert_eq!(stage.active_map(), Some("broken"));
    }

    #[test]
    fn test_panning_needs_middle_button() {
        let mut stage = StageController::new(&Settings::default());
        assert!(!stage.pan(10.0, 10.0));

        stage.pointer_down(PointerButton::Middle);
        assert!(stage.pan(10.0, -5.0));
        assert_eq!(stage.offset(), Point::new(10.0, -5.0));

        stage.pointer_down(PointerButton::Primary);
        assert!(!stage.is_draggable());
    }

    #[test]
    fn test_resize_fits_container_width() {
        let mut stage = StageController::new(&Settings::default());
        stage.resize(1408.0);
        assert_eq!(stage.display_size(), Size::new(1408.0, 1408.0));
        assert_eq!(stage.scale(), 0.12);
    }

    #[test]
    fn test_hit_test_prefers_marker_layer() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);
        stage.begin_drag(DragKind::Image, "1700");
        stage.drop_at(screen(&stage, 100.0, 100.0), "", &StubResources);
        stage.begin_drag(DragKind::Icon, "flag");
        stage.drop_at(screen(&stage, 100.0, 100.0), "", &StubResources);

        let pointer = screen(&stage, 100.0, 100.0);
        let (target, part) = stage.hit_test(pointer, &|_| true).unwrap();
        assert_eq!(target.layer, LayerKind::Marker);
        assert_eq!(part, Part::Body);

        let only_images = |object: &SceneObject| object.kind() == ObjectKind::MapImage;
        let (target, _) = stage.hit_test(pointer, &only_images).unwrap();
        assert_eq!(target.layer, LayerKind::Map);
    }

    #[test]
    fn test_dotted_resource_ids_are_kept_whole() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let resources = crate::io::resources::FsResources::with_dirs(tmp.path().join("shots"), tmp.path().join("icons"));
        std::fs::create_dir_all(resources.icon_folder()).unwrap();
        std::fs::create_dir_all(resources.image_folder("base")).unwrap();
        std::fs::write(resources.icon_folder().join("tank.v2.svg"), b"<svg/>").unwrap();
        std::fs::write(resources.icon_folder().join("tank.svg"), b"<svg/>").unwrap();
        std::fs::write(resources.image_folder("base").join("shot.final.png"), b"png").unwrap();
        assert!(resources.list_icons().contains(&"tank.v2".to_string()));

        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);

        let icon = resources.icon_path("tank.v2");
        stage.begin_drag(DragKind::Icon, icon.to_string_lossy());
        let marker = stage
            .drop_at(screen(&stage, 100.0, 100.0), "", &resources)
            .unwrap()
            .placed
            .unwrap();
        assert_eq!(stage.layer(LayerKind::Marker).get(marker).unwrap().image_id(), Some("tank.v2"));

        let screenshot = resources.map_image_path("base", "shot.final");
        stage.begin_drag(DragKind::Image, screenshot.to_string_lossy());
        let image = stage
            .drop_at(screen(&stage, 100.0, 100.0), "", &resources)
            .unwrap()
            .placed
            .unwrap();
        assert_eq!(stage.layer(LayerKind::Map).get(image).unwrap().image_id(), Some("shot.final"));
    }

    #[test]
    fn test_failed_write_keeps_scene_and_is_not_retried() {
        let mut repository = MemoryMapRepository::default();
        let mut stage = stage_with_map(&mut repository);

        stage.begin_drag(DragKind::Icon, "flag");
        let id = stage
            .drop_at(screen(&stage, 100.0, 100.0), "", &StubResources)
            .unwrap()
            .placed
            .unwrap();
        repository.delete_map("base").unwrap();
        let writes = repository.writes;

        let remaining = stage.persist_changes(&mut repository);
        assert!(remaining.is_empty());
        assert_eq!(repository.writes, writes);
        assert!(stage.layer(LayerKind::Marker).get(id).is_some());

        assert!(!stage.save_layer(LayerKind::Marker, &mut repository));
        assert_eq!(repository.writes, writes);
        assert!(stage.layer(LayerKind::Marker).get(id).is_some());
        assert!(stage.drain_events().is_empty());
    }

    #[test]
    fn test_save_without_map_is_skipped() {
        let mut repository = MemoryMapRepository::default();
        let stage = StageController::new(&Settings::default());
        assert!(!stage.save_layer(LayerKind::Marker, &mut repository));
        assert_eq!(repository.writes, 0);
    }
}
