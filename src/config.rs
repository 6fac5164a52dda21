// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Settings are read from a YAML file named by `MAPBOARD_CONFIG`, falling
//! back to `mapboard.yaml` in the working directory. Every field has a
//! default, so a partial (or missing) file is fine.

use crate::util::geometry::Size;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "MAPBOARD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "mapboard.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of stored maps and screenshots.
    pub data_dir: PathBuf,
    /// Folder of `.svg` marker icons.
    pub icon_dir: PathBuf,
    pub stage: StageSettings,
    pub grid: GridSettings,
    pub zoom: ZoomSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            icon_dir: PathBuf::from("./icons"),
            stage: StageSettings::default(),
            grid: GridSettings::default(),
            zoom: ZoomSettings::default(),
        }
    }
}

/// Logical stage size in design units and the starting zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageSettings {
    pub width: f64,
    pub height: f64,
    pub initial_scale: f64,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            width: 704.0,
            height: 704.0,
            initial_scale: 0.12,
        }
    }
}

impl StageSettings {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.initial_scale > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub rows: usize,
    pub cols: usize,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            rows: 7,
            cols: 7,
            cell_width: 790.0,
            cell_height: 425.0,
        }
    }
}

impl GridSettings {
    pub fn cell_size(&self) -> Size {
        Size::new(self.cell_width, self.cell_height)
    }

    fn is_valid(&self) -> bool {
        self.cell_width > 0.0 && self.cell_height > 0.0
    }
}

/// Wheel zoom step and optional scale bounds (unbounded when unset).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    pub factor: f64,
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            factor: 1.1,
            min_scale: None,
            max_scale: None,
        }
    }
}

impl ZoomSettings {
    fn is_valid(&self) -> bool {
        let positive = |bound: Option<f64>| bound.map_or(true, |value| value > 0.0);
        let ordered = match (self.min_scale, self.max_scale) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        };
        self.factor > 0.0 && positive(self.min_scale) && positive(self.max_scale) && ordered
    }
}

impl Settings {
    /// Parse settings from YAML text, replacing invalid sections with defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(text).context("Failed to parse settings YAML")?;
        Ok(settings.validated())
    }

    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml(&text)
    }

    /// Load settings from the configured location, or defaults if that
    /// fails. A missing file is not an error.
    pub fn load_or_default() -> Self {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            log::info!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings: {:#}", e);
                Self::default()
            }
        }
    }

    fn validated(mut self) -> Self {
        if !self.stage.is_valid() {
            log::warn!("Invalid stage settings {:?}, using defaults", self.stage);
            self.stage = StageSettings::default();
        }
        if !self.grid.is_valid() {
            log::warn!("Invalid grid settings {:?}, using defaults", self.grid);
            self.grid = GridSettings::default();
        }
        if !self.zoom.is_valid() {
            log::warn!("Invalid zoom settings {:?}, using defaults", self.zoom);
            self.zoom = ZoomSettings::default();
        }
        self
    }
}
