// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Map canvas.
//!
//! Paints the stage (grid, map images, markers) and translates raw egui
//! pointer input into `CanvasAction`s for the stage controller. The canvas
//! itself never mutates the scene.

use crate::controller::interaction::{CursorStyle, ObjectEvent, PointerButton};
use crate::controller::stage::{ObjectTarget, StageController};
use crate::io::media::ImageCache;
use crate::io::resources::ResourceProvider;
use crate::models::layer::LayerKind;
use crate::models::scene::{
    ArrowGroup, Part, SceneObject, TextLabel, ARROW_BORDER_WIDTH, ARROW_POINTER_SIZE,
    ARROW_STROKE_WIDTH, GRID_STROKE_WIDTH, HANDLE_CIRCLE_RADIUS, MARKER_OPACITY, MARKER_SIZE,
    TEXT_FONT_SIZE, TEXT_STROKE_WIDTH, TEXT_WIDTH,
};
use crate::util::geometry::{Point, Transform};
use egui::{Color32, Pos2, Rect, Stroke};
use std::path::PathBuf;

/// Result of canvas interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasAction {
    Resize(f64),
    Wheel { pointer: Point, delta_y: f64 },
    StagePointerDown(PointerButton),
    Pan { dx: f64, dy: f64 },
    Object {
        target: ObjectTarget,
        part: Part,
        event: ObjectEvent,
    },
    /// Palette item released over the canvas at this stage-space point.
    Drop(Point),
    CancelDrag,
}

/// Pointer bookkeeping carried between frames.
#[derive(Debug, Default)]
pub struct CanvasState {
    pub hovered: Option<(ObjectTarget, Part)>,
    /// Object that took over the current drag gesture.
    pub grabbed: Option<(ObjectTarget, Part)>,
}

impl CanvasState {
    /// Forget an object that no longer exists.
    pub fn release(&mut self, target: ObjectTarget) {
        if self.hovered.is_some_and(|(hovered, _)| hovered == target) {
            self.hovered = None;
        }
        if self.grabbed.is_some_and(|(grabbed, _)| grabbed == target) {
            self.grabbed = None;
        }
    }
}

/// File backing an image object, if it has one.
fn image_path(object: &SceneObject, resources: &dyn ResourceProvider, map_name: &str) -> Option<PathBuf> {
    let image_id = object.image_id()?;
    match object {
        SceneObject::MapImage(_) => Some(resources.map_image_path(map_name, image_id)),
        _ => Some(resources.icon_path(image_id)),
    }
}

fn to_button(button: egui::PointerButton) -> PointerButton {
    match button {
        egui::PointerButton::Primary => PointerButton::Primary,
        egui::PointerButton::Middle => PointerButton::Middle,
        egui::PointerButton::Secondary => PointerButton::Secondary,
        _ => PointerButton::Other,
    }
}

fn to_point(pos: Pos2, origin: Pos2) -> Point {
    Point::new((pos.x - origin.x) as f64, (pos.y - origin.y) as f64)
}

/// Display the stage and collect the input it received this frame.
pub fn show(
    ui: &mut egui::Ui,
    stage: &StageController,
    state: &mut CanvasState,
    images: &mut ImageCache,
    resources: &dyn ResourceProvider,
    palette_drag: bool,
) -> Vec<CanvasAction> {
    let mut actions = Vec::new();

    let available_width = ui.available_width() as f64;
    if (available_width - stage.display_size().width).abs() > 0.5 {
        actions.push(CanvasAction::Resize(available_width));
    }

    let Some(map_name) = stage.active_map() else {
        ui.centered_and_justified(|ui| {
            ui.label(
                egui::RichText::new("Create or select a map to begin")
                    .color(Color32::from_gray(180)),
            );
        });
        if palette_drag && ui.input(|i| i.pointer.any_released()) {
            actions.push(CanvasAction::CancelDrag);
        }
        return actions;
    };

    let size = egui::vec2(
        stage.display_size().width as f32,
        stage.display_size().height as f32,
    );
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, Color32::from_gray(60));

    // start decoding anything not seen yet
    for kind in [LayerKind::Map, LayerKind::Marker] {
        for object in stage.layer(kind).objects() {
            if let Some(path) = image_path(object, resources, map_name) {
                images.request(&path);
            }
        }
    }

    let images = &*images;
    let visible = |object: &SceneObject| {
        image_path(object, resources, map_name).map_or(true, |path| images.is_ready(&path))
    };

    paint_stage(&painter, rect.min, stage, images, resources, map_name);

    let pointer = ui.input(|i| i.pointer.interact_pos()).filter(|pos| rect.contains(*pos));
    let hit = pointer.and_then(|pos| stage.hit_test(to_point(pos, rect.min), &visible));

    // hover enter/leave
    if hit != state.hovered && state.grabbed.is_none() {
        if let Some((target, part)) = state.hovered {
            actions.push(CanvasAction::Object {
                target,
                part,
                event: ObjectEvent::PointerLeave,
            });
        }
        if let Some((target, part)) = hit {
            actions.push(CanvasAction::Object {
                target,
                part,
                event: ObjectEvent::PointerEnter,
            });
        }
        state.hovered = hit;
    }

    // presses
    if pointer.is_some() {
        for button in [
            egui::PointerButton::Primary,
            egui::PointerButton::Middle,
            egui::PointerButton::Secondary,
        ] {
            if ui.input(|i| i.pointer.button_pressed(button)) {
                let button = to_button(button);
                actions.push(CanvasAction::StagePointerDown(button));
                if let Some((target, part)) = hit {
                    actions.push(CanvasAction::Object {
                        target,
                        part,
                        event: ObjectEvent::PointerDown(button),
                    });
                }
            }
        }
    }

    // drags
    if response.drag_started() {
        let origin = ui.input(|i| i.pointer.press_origin());
        let middle_held = ui.input(|i| i.pointer.middle_down());
        let pressed = origin.and_then(|pos| stage.hit_test(to_point(pos, rect.min), &visible));
        if let Some((target, part)) = pressed {
            actions.push(CanvasAction::Object {
                target,
                part,
                event: ObjectEvent::DragStart { middle_held },
            });
        }
    }

    if response.dragged() {
        let delta = response.drag_delta();
        match state.grabbed {
            Some((target, part)) => {
                let scale = stage.scale();
                actions.push(CanvasAction::Object {
                    target,
                    part,
                    event: ObjectEvent::DragMove {
                        dx: delta.x as f64 / scale,
                        dy: delta.y as f64 / scale,
                    },
                });
            }
            None if stage.is_draggable() && delta != egui::Vec2::ZERO => actions.push(CanvasAction::Pan {
                dx: delta.x as f64,
                dy: delta.y as f64,
            }),
            None => {}
        }
    }

    if response.drag_stopped() {
        if let Some((target, part)) = state.grabbed.take() {
            let release = ui
                .input(|i| i.pointer.interact_pos())
                .map(|pos| stage.to_layer(target.layer, to_point(pos, rect.min)));
            actions.push(CanvasAction::Object {
                target,
                part,
                event: ObjectEvent::DragEnd { pointer: release },
            });
        }
    }

    // wheel zoom
    if let Some(pos) = pointer {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            actions.push(CanvasAction::Wheel {
                pointer: to_point(pos, rect.min),
                delta_y: -scroll as f64,
            });
        }
    }

    // palette drops
    if palette_drag {
        if ui.input(|i| i.pointer.any_released()) {
            let released = ui.input(|i| i.pointer.latest_pos()).filter(|pos| rect.contains(*pos));
            actions.push(match released {
                Some(pos) => CanvasAction::Drop(to_point(pos, rect.min)),
                None => CanvasAction::CancelDrag,
            });
        }
        ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
    } else if pointer.is_some() && stage.cursor() == CursorStyle::Move {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Move);
    }

    actions
}

fn paint_stage(
    painter: &egui::Painter,
    origin: Pos2,
    stage: &StageController,
    images: &ImageCache,
    resources: &dyn ResourceProvider,
    map_name: &str,
) {
    let scale = stage.scale() as f32;

    for layer in stage.layers() {
        let transform = stage.layer_transform(layer.kind());
        let screen = |point: Point| {
            let p = transform.apply(point);
            origin + egui::vec2(p.x as f32, p.y as f32)
        };

        for object in layer.objects() {
            match object {
                SceneObject::GridLine(line) => {
                    painter.line_segment(
                        [screen(line.start), screen(line.end)],
                        Stroke::new(GRID_STROKE_WIDTH as f32 * scale, Color32::BLACK),
                    );
                }
                SceneObject::MapImage(image) => {
                    let path = resources.map_image_path(map_name, &image.image_id);
                    if let Some(texture) = images.texture(&path) {
                        let corner = image.position.offset(image.size.width, image.size.height);
                        paint_texture(painter, texture, Rect::from_min_max(screen(image.position), screen(corner)), Color32::WHITE);
                    }
                }
                SceneObject::Marker(marker) => {
                    let path = resources.icon_path(&marker.image_id);
                    if let Some(texture) = images.texture(&path) {
                        let corner = marker.position.offset(MARKER_SIZE.width, MARKER_SIZE.height);
                        let tint = Color32::from_white_alpha((MARKER_OPACITY * 255.0).round() as u8);
                        paint_texture(painter, texture, Rect::from_min_max(screen(marker.position), screen(corner)), tint);
                    }
                }
                SceneObject::Text(label) => paint_text(painter, label, screen(label.position), scale),
                SceneObject::Arrow(arrow) => paint_arrow(painter, arrow, &transform, origin, scale),
            }
        }
    }
}

fn paint_texture(painter: &egui::Painter, texture: &egui::TextureHandle, rect: Rect, tint: Color32) {
    let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    painter.image(texture.id(), rect, uv, tint);
}

/// White bold-ish text with a black outline, wrapped at the label width.
fn paint_text(painter: &egui::Painter, label: &TextLabel, pos: Pos2, scale: f32) {
    let font = egui::FontId::proportional(TEXT_FONT_SIZE as f32 * scale);
    let galley = painter.layout(label.text.clone(), font, Color32::WHITE, TEXT_WIDTH as f32 * scale);

    let outline = (TEXT_STROKE_WIDTH as f32 * scale).max(0.5);
    for offset in [
        egui::vec2(-outline, 0.0),
        egui::vec2(outline, 0.0),
        egui::vec2(0.0, -outline),
        egui::vec2(0.0, outline),
    ] {
        painter.galley_with_override_text_color(pos + offset, galley.clone(), Color32::BLACK);
    }
    painter.galley(pos, galley, Color32::WHITE);
}

fn paint_arrow(painter: &egui::Painter, arrow: &ArrowGroup, transform: &Transform, origin: Pos2, scale: f32) {
    let screen = |x: f64, y: f64| {
        let p = transform.apply(Point::new(x, y));
        origin + egui::vec2(p.x as f32, p.y as f32)
    };

    let from = screen(arrow.body[0], arrow.body[1]);
    let to = screen(arrow.body[2], arrow.body[3]);
    painter.line_segment([from, to], Stroke::new(ARROW_STROKE_WIDTH as f32 * scale, Color32::BLACK));

    let head = ARROW_POINTER_SIZE as f32 * scale;
    paint_arrow_head(painter, from, to, head);
    paint_arrow_head(painter, to, from, head);

    let border_from = screen(arrow.border[0], arrow.border[1]);
    let border_to = screen(arrow.border[2], arrow.border[3]);
    painter.line_segment(
        [border_from, border_to],
        Stroke::new(ARROW_BORDER_WIDTH as f32 * scale, Color32::WHITE),
    );

    let radius = HANDLE_CIRCLE_RADIUS as f32 * scale;
    for handle in [arrow.start_handle, arrow.end_handle] {
        let center = screen(handle.x, handle.y);
        painter.circle(
            center,
            radius,
            Color32::from_white_alpha(26),
            Stroke::new(GRID_STROKE_WIDTH as f32 * scale, Color32::BLACK),
        );
    }
}

/// Filled triangle at `tip`, pointing away from `tail`.
fn paint_arrow_head(painter: &egui::Painter, tail: Pos2, tip: Pos2, size: f32) {
    let direction = tip - tail;
    let length = direction.length();
    if length <= f32::EPSILON {
        return;
    }

    let along = direction / length;
    let across = egui::vec2(-along.y, along.x) * (size / 2.0);
    let base = tip - along * size;
    painter.add(egui::Shape::convex_polygon(
        vec![tip, base + across, base - across],
        Color32::BLACK,
        Stroke::NONE,
    ));
}
