// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Screenshot and icon resources.
//!
//! The scene only stores image ids; this module resolves them to files.
//! Map screenshots live in one folder per map as `<id>.png`, marker icons
//! in a shared folder as `<id>.svg`.

use crate::config::Settings;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const IMAGE_EXTENSION: &str = "png";
pub const ICON_EXTENSION: &str = "svg";

/// Errors raised while resolving or touching resource files.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Resource not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Resource I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },
}

/// Resolves image ids to files on disk.
pub trait ResourceProvider {
    /// Folder holding the screenshots of one map.
    fn image_folder(&self, map_name: &str) -> PathBuf;

    /// Folder holding the marker icons.
    fn icon_folder(&self) -> PathBuf;

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn map_image_path(&self, map_name: &str, image_id: &str) -> PathBuf {
        self.image_folder(map_name)
            .join(format!("{image_id}.{IMAGE_EXTENSION}"))
    }

    fn icon_path(&self, image_id: &str) -> PathBuf {
        self.icon_folder().join(format!("{image_id}.{ICON_EXTENSION}"))
    }
}

/// File name without directory and extension: `/a/b/1700.png` -> `1700`.
///
/// Only the last extension goes, so `icons/tank.v2.svg` -> `tank.v2`.
pub fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Resources stored under the configured data and icon directories.
pub struct FsResources {
    screenshots_dir: PathBuf,
    icon_dir: PathBuf,
}

impl FsResources {
    pub fn new(settings: &Settings) -> Self {
        Self::with_dirs(
            settings.data_dir.join("screenshots").join("map"),
            settings.icon_dir.clone(),
        )
    }

    pub fn with_dirs(screenshots_dir: PathBuf, icon_dir: PathBuf) -> Self {
        Self {
            screenshots_dir,
            icon_dir,
        }
    }

    /// Screenshot ids of a map, newest first.
    pub fn list_screenshots(&self, map_name: &str) -> Vec<String> {
        let mut ids = list_ids(&self.image_folder(map_name), IMAGE_EXTENSION);
        // ids are millisecond timestamps, so reverse order is newest first
        ids.sort_by(|a, b| b.cmp(a));
        ids
    }

    /// Icon ids available for markers, alphabetically.
    pub fn list_icons(&self) -> Vec<String> {
        let mut ids = list_ids(&self.icon_dir, ICON_EXTENSION);
        ids.sort();
        ids
    }

    /// Copy an image file into the map's screenshot folder as PNG.
    ///
    /// Returns the new screenshot id.
    pub fn import_screenshot(&self, map_name: &str, source: &Path) -> Result<String> {
        let folder = self.image_folder(map_name);
        fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create {}", folder.display()))?;

        let image = image::open(source)
            .with_context(|| format!("Failed to decode {}", source.display()))?;

        let id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("System clock is before the Unix epoch")?
            .as_millis()
            .to_string();
        let target = self.map_image_path(map_name, &id);

        image
            .save_with_format(&target, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        log::info!("Imported screenshot {} into map '{}'", id, map_name);
        Ok(id)
    }

    pub fn delete_screenshot(&self, map_name: &str, image_id: &str) -> Result<(), ResourceError> {
        let path = self.map_image_path(map_name, image_id);
        if !path.exists() {
            return Err(ResourceError::NotFound(path));
        }
        fs::remove_file(&path)?;
        log::info!("Deleted screenshot {}", path.display());
        Ok(())
    }
}

impl ResourceProvider for FsResources {
    fn image_folder(&self, map_name: &str) -> PathBuf {
        self.screenshots_dir.join(map_name)
    }

    fn icon_folder(&self) -> PathBuf {
        self.icon_dir.clone()
    }
}

fn list_ids(folder: &Path, extension: &str) -> Vec<String> {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Cannot list {}: {}", folder.display(), e);
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(extension))
        .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .collect()
}

/// Test double that claims every resource exists.
#[cfg(test)]
pub struct StubResources;

#[cfg(test)]
impl ResourceProvider for StubResources {
    fn image_folder(&self, map_name: &str) -> PathBuf {
        PathBuf::from("screenshots").join(map_name)
    }

    fn icon_folder(&self) -> PathBuf {
        PathBuf::from("icons")
    }

    fn path_exists(&self, _path: &Path) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_resources() -> (FsResources, tempfile::TempDir) {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let resources = FsResources::with_dirs(tmp.path().join("shots"), tmp.path().join("icons"));
        (resources, tmp)
    }

    #[test]
    fn test_file_name_of_strips_folder_and_extension() {
        assert_eq!(file_name_of("/data/screenshots/map/base/1700000000000.png"), "1700000000000");
        assert_eq!(file_name_of("icons/tank.svg"), "tank");
        assert_eq!(file_name_of("icons/tank.v2.svg"), "tank.v2");
        assert_eq!(file_name_of(""), "");
    }

    #[test]
    fn test_paths_use_fixed_extensions() {
        let resources = FsResources::with_dirs(PathBuf::from("shots"), PathBuf::from("icons"));
        assert_eq!(
            resources.map_image_path("base", "42"),
            PathBuf::from("shots").join("base").join("42.png")
        );
        assert_eq!(resources.icon_path("tank"), PathBuf::from("icons").join("tank.svg"));
    }

    #[test]
    fn test_list_screenshots_newest_first() {
        let (resources, _tmp) = temp_resources();
        let folder = resources.image_folder("base");
        fs::create_dir_all(&folder).unwrap();
        for name in ["100.png", "300.png", "200.png", "notes.txt"] {
            fs::write(folder.join(name), b"x").unwrap();
        }

        assert_eq!(resources.list_screenshots("base"), vec!["300", "200", "100"]);
        assert!(resources.list_screenshots("missing").is_empty());
    }

    #[test]
    fn test_list_icons_sorted() {
        let (resources, _tmp) = temp_resources();
        fs::create_dir_all(resources.icon_folder()).unwrap();
        for name in ["tank.svg", "flag.svg", "readme.md"] {
            fs::write(resources.icon_folder().join(name), b"<svg/>").unwrap();
        }

        assert_eq!(resources.list_icons(), vec!["flag", "tank"]);
    }

    #[test]
    fn test_import_and_delete_screenshot() {
        let (resources, tmp) = temp_resources();
        let source = tmp.path().join("capture.png");
        image::RgbaImage::new(4, 3).save(&source).unwrap();

        let id = resources.import_screenshot("base", &source).unwrap();
        assert!(resources.map_image_path("base", &id).exists());
        assert_eq!(resources.list_screenshots("base"), vec![id.clone()]);

        resources.delete_screenshot("base", &id).unwrap();
        assert!(resources.list_screenshots("base").is_empty());
        assert!(matches!(
            resources.delete_screenshot("base", &id),
            Err(ResourceError::NotFound(_))
        ));
    }
}
