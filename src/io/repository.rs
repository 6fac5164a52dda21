// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Map storage.
//!
//! Maps are persisted as two JSON documents each. The file-based store
//! uses this layout:
//!
//! ```text
//! data/maps/
//! ├── <name>.json                 # image layer
//! └── markers/
//!     └── <name>-markers.json     # marker layer (optional)
//! ```

use crate::io::serialization;
use crate::models::map::{validate_map_name, MapDocuments};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by map storage.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Map not found: {0}")]
    NotFound(String),

    #[error("Map already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid map name: {0:?}")]
    InvalidName(String),

    #[error("Map storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Named map persistence consumed by the application.
pub trait MapRepository {
    /// All map names, alphabetically.
    fn list_maps(&self) -> RepositoryResult<Vec<String>>;

    fn get_map(&self, name: &str) -> RepositoryResult<MapDocuments>;

    /// Create an empty map and return its name.
    fn create_map(&mut self, name: &str) -> RepositoryResult<String>;

    /// Overwrite the image layer. The map must already exist.
    fn update_map_image_layer(&mut self, name: &str, document: &str) -> RepositoryResult<()>;

    /// Overwrite the marker layer, creating it on first write.
    fn update_map_marker_layer(&mut self, name: &str, document: &str) -> RepositoryResult<()>;

    /// Remove both documents of a map.
    fn delete_map(&mut self, name: &str) -> RepositoryResult<()>;
}

/// Map storage in plain JSON files.
pub struct FileMapRepository {
    maps_dir: PathBuf,
    markers_dir: PathBuf,
}

impl FileMapRepository {
    /// Open (and create if needed) the map folders under `data_dir`.
    pub fn new(data_dir: &Path) -> RepositoryResult<Self> {
        let maps_dir = data_dir.join("maps");
        let markers_dir = maps_dir.join("markers");
        fs::create_dir_all(&markers_dir)?;

        Ok(Self {
            maps_dir,
            markers_dir,
        })
    }

    fn image_path(&self, name: &str) -> PathBuf {
        self.maps_dir.join(format!("{name}.json"))
    }

    fn marker_path(&self, name: &str) -> PathBuf {
        self.markers_dir.join(format!("{name}-markers.json"))
    }
}

impl MapRepository for FileMapRepository {
    fn list_maps(&self) -> RepositoryResult<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.maps_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    fn get_map(&self, name: &str) -> RepositoryResult<MapDocuments> {
        let name = validate_map_name(name).map_err(|_| RepositoryError::NotFound(name.to_string()))?;

        let image_layer = match fs::read_to_string(self.image_path(name)) {
            Ok(document) => document,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let marker_layer = match fs::read_to_string(self.marker_path(name)) {
            Ok(document) => Some(document),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(MapDocuments {
            image_layer,
            marker_layer,
        })
    }

    fn create_map(&mut self, name: &str) -> RepositoryResult<String> {
        let name = validate_map_name(name)?;
        let path = self.image_path(name);
        if path.exists() {
            return Err(RepositoryError::AlreadyExists(name.to_string()));
        }

        fs::write(&path, serialization::empty_document())?;
        log::info!("Map added: {}", name);
        Ok(name.to_string())
    }

    fn update_map_image_layer(&mut self, name: &str, document: &str) -> RepositoryResult<()> {
        let name = validate_map_name(name)?;
        let path = self.image_path(name);
        if !path.is_file() {
            return Err(RepositoryError::NotFound(name.to_string()));
        }

        fs::write(&path, document)?;
        Ok(())
    }

    fn update_map_marker_layer(&mut self, name: &str, document: &str) -> RepositoryResult<()> {
        let name = validate_map_name(name)?;
        fs::write(self.marker_path(name), document)?;
        Ok(())
    }

    fn delete_map(&mut self, name: &str) -> RepositoryResult<()> {
        let name = validate_map_name(name)?;
        let path = self.image_path(name);
        if !path.exists() {
            return Err(RepositoryError::NotFound(name.to_string()));
        }

        fs::remove_file(&path)?;
        match fs::remove_file(self.marker_path(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        log::info!("Map deleted: {}", name);
        Ok(())
    }
}

/// In-memory store that also counts writes.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryMapRepository {
    maps: std::collections::BTreeMap<String, MapDocuments>,
    pub writes: usize,
}

#[cfg(test)]
impl MapRepository for MemoryMapRepository {
    fn list_maps(&self) -> RepositoryResult<Vec<String>> {
        Ok(self.maps.keys().cloned().collect())
    }

    fn get_map(&self, name: &str) -> RepositoryResult<MapDocuments> {
        self.maps
            .get(name)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))
    }

    fn create_map(&mut self, name: &str) -> RepositoryResult<String> {
        let name = validate_map_name(name)?;
        if self.maps.contains_key(name) {
            return Err(RepositoryError::AlreadyExists(name.to_string()));
        }
        self.maps.insert(
            name.to_string(),
            MapDocuments {
                image_layer: serialization::empty_document(),
                marker_layer: None,
            },
        );
        Ok(name.to_string())
    }

    fn update_map_image_layer(&mut self, name: &str, document: &str) -> RepositoryResult<()> {
        let map = self
            .maps
            .get_mut(name)
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;
        map.image_layer = document.to_string();
        self.writes += 1;
        Ok(())
    }

    fn update_map_marker_layer(&mut self, name: &str, document: &str) -> RepositoryResult<()> {
        let map = self
            .maps
            .get_mut(name)
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))?;
        map.marker_layer = Some(document.to_string());
        self.writes += 1;
        Ok(())
    }

    fn delete_map(&mut self, name: &str) -> RepositoryResult<()> {
        self.maps
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))
    }
}
