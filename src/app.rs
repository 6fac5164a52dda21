// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! `MapBoardApp` owns the stage controller, the map store and the
//! resource folders. It routes panel and canvas actions to them and acts
//! as the persistence listener: every layer change the stage reports is
//! written back to the active map.

use crate::config::Settings;
use crate::controller::interaction::{Confirm, Outcome};
use crate::controller::stage::{DragKind, StageController, StageEvent};
use crate::io::dialog::{show_error, DialogConfirm};
use crate::io::media::ImageCache;
use crate::io::repository::{FileMapRepository, MapRepository};
use crate::io::resources::{FsResources, ResourceProvider};
use crate::ui::canvas::{self, CanvasAction, CanvasState};
use crate::ui::map_list::{self, MapListAction};
use crate::ui::toolbar::{self, ToolbarAction};
use anyhow::{Context, Result};

/// Main application state.
pub struct MapBoardApp {
    stage: StageController,
    repository: Box<dyn MapRepository>,
    resources: FsResources,
    images: ImageCache,
    canvas: CanvasState,

    /// Map names, alphabetically
    maps: Vec<String>,
    /// Screenshot ids of the active map, newest first
    screenshots: Vec<String>,
    /// Marker icon ids
    icons: Vec<String>,

    new_map_name: String,
    text_input: String,
}

impl MapBoardApp {
    /// Open the map store and select the first map.
    pub fn new(settings: &Settings) -> Result<Self> {
        let repository = FileMapRepository::new(&settings.data_dir)
            .with_context(|| format!("Failed to open map storage in {}", settings.data_dir.display()))?;
        let resources = FsResources::new(settings);
        let icons = resources.list_icons();
        log::info!("Found {} marker icons in {}", icons.len(), settings.icon_dir.display());

        let mut app = Self {
            stage: StageController::new(settings),
            repository: Box::new(repository),
            resources,
            images: ImageCache::new(),
            canvas: CanvasState::default(),
            maps: Vec::new(),
            screenshots: Vec::new(),
            icons,
            new_map_name: String::new(),
            text_input: String::new(),
        };

        app.refresh_maps();
        if let Some(first) = app.maps.first().cloned() {
            app.select_map(&first);
        }
        Ok(app)
    }

    fn refresh_maps(&mut self) {
        match self.repository.list_maps() {
            Ok(maps) => self.maps = maps,
            Err(e) => log::error!("Failed to list maps: {}", e),
        }
    }

    fn refresh_screenshots(&mut self) {
        self.screenshots = match self.stage.active_map() {
            Some(name) => self.resources.list_screenshots(name),
            None => Vec::new(),
        };
    }

    /// Load a map into the stage. Selecting the active map does nothing.
    fn select_map(&mut self, name: &str) {
        if self.stage.active_map() == Some(name) {
            return;
        }

        match self.repository.get_map(name) {
            Ok(documents) => {
                self.canvas = CanvasState::default();
                self.stage.switch_map(name, &documents, &self.resources);
            }
            Err(e) => show_error("Cannot open map", &e.to_string()),
        }
        self.refresh_screenshots();
    }

    fn create_map(&mut self, name: &str) {
        match self.repository.create_map(name.trim()) {
            Ok(created) => {
                self.new_map_name.clear();
                self.refresh_maps();
                self.select_map(&created);
            }
            Err(e) => show_error("Cannot create map", &e.to_string()),
        }
    }

    fn delete_map(&mut self, name: &str) {
        if !DialogConfirm.confirm(&format!("Delete map: {name}")) {
            return;
        }

        if let Err(e) = self.repository.delete_map(name) {
            show_error("Cannot delete map", &e.to_string());
            return;
        }

        self.refresh_maps();
        if self.stage.active_map() == Some(name) {
            self.stage.clear_map();
            self.canvas = CanvasState::default();
            if let Some(first) = self.maps.first().cloned() {
                self.select_map(&first);
            }
        }
        self.refresh_screenshots();
    }

    fn import_screenshot(&mut self) {
        let Some(map_name) = self.stage.active_map().map(str::to_string) else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "webp"])
            .pick_file()
        else {
            return;
        };

        match self.resources.import_screenshot(&map_name, &path) {
            Ok(_) => self.refresh_screenshots(),
            Err(e) => show_error("Cannot import screenshot", &format!("{e:#}")),
        }
    }

    fn delete_screenshot(&mut self, id: &str) {
        let Some(map_name) = self.stage.active_map().map(str::to_string) else {
            return;
        };
        if !DialogConfirm.confirm("Delete screenshot?") {
            return;
        }

        match self.resources.delete_screenshot(&map_name, id) {
            Ok(()) => {
                self.images.forget(&self.resources.map_image_path(&map_name, id));
                self.refresh_screenshots();
            }
            Err(e) => show_error("Cannot delete screenshot", &e.to_string()),
        }
    }

    fn handle_canvas_action(&mut self, action: CanvasAction) {
        match action {
            CanvasAction::Resize(width) => self.stage.resize(width),
            CanvasAction::Wheel { pointer, delta_y } => self.stage.wheel(pointer, delta_y),
            CanvasAction::StagePointerDown(button) => self.stage.pointer_down(button),
            CanvasAction::Pan { dx, dy } => {
                self.stage.pan(dx, dy);
            }
            CanvasAction::Object { target, part, event } => {
                let outcome = self.stage.object_event(target, part, event, &mut DialogConfirm);
                match outcome {
                    Outcome::Grabbed => self.canvas.grabbed = Some((target, part)),
                    Outcome::Deleted => self.canvas.release(target),
                    _ => {}
                }
            }
            CanvasAction::Drop(pointer) => {
                let was_text = self.stage.pending_drag().is_some_and(|item| item.kind == DragKind::Text);
                self.stage.drop_at(pointer, &self.text_input, &self.resources);
                if was_text {
                    self.text_input.clear();
                }
            }
            CanvasAction::CancelDrag => self.stage.cancel_drag(),
        }
    }

    /// Write changed layers and react to stage notifications.
    fn persist(&mut self) {
        for event in self.stage.persist_changes(self.repository.as_mut()) {
            match event {
                StageEvent::Loaded(name) => log::info!("Map loaded: {}", name),
                StageEvent::LayerChanged(_) => {}
            }
        }
    }
}

impl eframe::App for MapBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pick up finished image decodes
        if self.images.poll(ctx) || self.images.has_pending() {
            ctx.request_repaint();
        }

        // Tools palette (left side)
        let toolbar_action = egui::SidePanel::left("tools")
            .default_width(220.0)
            .show(ctx, |ui| {
                toolbar::show(ui, &self.icons, &mut self.text_input, &mut self.images, &self.resources)
            })
            .inner;

        if let ToolbarAction::BeginDrag(kind, source) = toolbar_action {
            self.stage.begin_drag(kind, source);
        }

        // Maps and screenshots (right side)
        let map_action = egui::SidePanel::right("maps")
            .default_width(240.0)
            .show(ctx, |ui| {
                map_list::show(
                    ui,
                    &self.maps,
                    self.stage.active_map(),
                    &mut self.new_map_name,
                    &self.screenshots,
                    &mut self.images,
                    &self.resources,
                )
            })
            .inner;

        match map_action {
            MapListAction::Select(name) => self.select_map(&name),
            MapListAction::Create(name) => self.create_map(&name),
            MapListAction::Delete(name) => self.delete_map(&name),
            MapListAction::ImportScreenshot => self.import_screenshot(),
            MapListAction::DeleteScreenshot(id) => self.delete_screenshot(&id),
            MapListAction::BeginDrag(kind, source) => self.stage.begin_drag(kind, source),
            MapListAction::None => {}
        }

        // Map canvas (center)
        let palette_drag = self.stage.pending_drag().is_some();
        let canvas_actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(
                    ui,
                    &self.stage,
                    &mut self.canvas,
                    &mut self.images,
                    &self.resources,
                    palette_drag,
                )
            })
            .inner;

        for action in canvas_actions {
            self.handle_canvas_action(action);
        }

        self.persist();
    }
}
