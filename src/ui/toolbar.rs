// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Map tools palette.
//!
//! Icons, the text tool and the arrow tool. Items are dragged onto the
//! canvas; the palette only reports which drag started.

use crate::controller::stage::DragKind;
use crate::io::media::ImageCache;
use crate::io::resources::ResourceProvider;

/// Result of palette interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    BeginDrag(DragKind, String),
}

const ICON_BUTTON_SIZE: f32 = 40.0;

/// Display the palette. `text_input` is the live text for text drops.
pub fn show(
    ui: &mut egui::Ui,
    icons: &[String],
    text_input: &mut String,
    images: &mut ImageCache,
    resources: &dyn ResourceProvider,
) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.heading("Tools");
    ui.separator();

    ui.label("Icons");
    if icons.is_empty() {
        ui.label(egui::RichText::new("No icons found").weak());
    }
    ui.horizontal_wrapped(|ui| {
        for icon in icons {
            let path = resources.icon_path(icon);
            images.request(&path);

            let response = match images.texture(&path) {
                Some(texture) => ui.add(
                    egui::Image::new((texture.id(), egui::vec2(ICON_BUTTON_SIZE, ICON_BUTTON_SIZE)))
                        .sense(egui::Sense::drag()),
                ),
                None => ui.add(egui::Label::new(icon.as_str()).sense(egui::Sense::drag())),
            };

            if response.on_hover_text(icon.as_str()).drag_started() {
                action = ToolbarAction::BeginDrag(DragKind::Icon, path.to_string_lossy().into_owned());
            }
        }
    });

    ui.add_space(8.0);
    ui.label("Text");
    ui.text_edit_singleline(text_input);
    let text_chip = ui.add(
        egui::Label::new(egui::RichText::new("✏ Drag text").strong()).sense(egui::Sense::drag()),
    );
    if text_chip.drag_started() {
        action = ToolbarAction::BeginDrag(DragKind::Text, String::new());
    }

    ui.add_space(8.0);
    let arrow_chip = ui.add(
        egui::Label::new(egui::RichText::new("↔ Drag arrow").strong()).sense(egui::Sense::drag()),
    );
    if arrow_chip.drag_started() {
        action = ToolbarAction::BeginDrag(DragKind::Arrow, String::new());
    }

    ui.add_space(8.0);
    ui.label(
        egui::RichText::new("Middle-drag to pan, wheel to zoom, right-click to delete")
            .italics()
            .weak(),
    );

    action
}
