// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Map selection and screenshot library panel.

use crate::controller::stage::DragKind;
use crate::io::media::ImageCache;
use crate::io::resources::ResourceProvider;

/// Result of map panel interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapListAction {
    None,
    Select(String),
    Create(String),
    Delete(String),
    ImportScreenshot,
    DeleteScreenshot(String),
    BeginDrag(DragKind, String),
}

const THUMBNAIL_WIDTH: f32 = 200.0;

/// Display maps and the active map's screenshots.
pub fn show(
    ui: &mut egui::Ui,
    maps: &[String],
    active_map: Option<&str>,
    new_map_name: &mut String,
    screenshots: &[String],
    images: &mut ImageCache,
    resources: &dyn ResourceProvider,
) -> MapListAction {
    let mut action = MapListAction::None;

    ui.heading("Maps");
    ui.separator();

    ui.horizontal(|ui| {
        ui.text_edit_singleline(new_map_name);
        if ui.button("➕ New").clicked() {
            action = MapListAction::Create(new_map_name.clone());
        }
    });

    egui::ScrollArea::vertical()
        .id_source("map_list")
        .max_height(200.0)
        .show(ui, |ui| {
            if maps.is_empty() {
                ui.label(egui::RichText::new("No maps yet").weak());
            }
            for name in maps {
                let selected = active_map == Some(name.as_str());
                ui.horizontal(|ui| {
                    if ui.selectable_label(selected, name).clicked() {
                        action = MapListAction::Select(name.clone());
                    }
                    if ui.small_button("🗑").on_hover_text("Delete map").clicked() {
                        action = MapListAction::Delete(name.clone());
                    }
                });
            }
        });

    let Some(map_name) = active_map else {
        return action;
    };

    ui.separator();
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Screenshots").strong());
        if ui.button("Import...").clicked() {
            action = MapListAction::ImportScreenshot;
        }
    });

    egui::ScrollArea::vertical()
        .id_source("screenshot_list")
        .show(ui, |ui| {
            if screenshots.is_empty() {
                ui.label(egui::RichText::new("Import a screenshot, then drag it onto the grid").weak());
            }
            for id in screenshots {
                let path = resources.map_image_path(map_name, id);
                images.request(&path);

                let response = match images.texture(&path) {
                    Some(texture) => {
                        let [width, height] = texture.size();
                        let aspect = height as f32 / width.max(1) as f32;
                        let size = egui::vec2(THUMBNAIL_WIDTH, THUMBNAIL_WIDTH * aspect);
                        ui.add(egui::Image::new((texture.id(), size)).sense(egui::Sense::click_and_drag()))
                    }
                    None => ui.add(egui::Label::new(id.as_str()).sense(egui::Sense::click_and_drag())),
                };

                if response.drag_started() {
                    action = MapListAction::BeginDrag(DragKind::Image, path.to_string_lossy().into_owned());
                }
                if response.secondary_clicked() {
                    action = MapListAction::DeleteScreenshot(id.clone());
                }
            }
        });

    action
}
