// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image loading for the canvas.
//!
//! Screenshots are decoded with `image`, marker icons are rasterized from
//! SVG with `resvg`. Decoding runs on background threads; finished images
//! are turned into egui textures on the UI thread by `ImageCache::poll`.

use super::resources::{ResourceError, ICON_EXTENSION};
use resvg::{tiny_skia, usvg};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Edge length, in pixels, icons are rasterized at.
pub const ICON_RENDER_SIZE: u32 = 140;

/// Decoded RGBA pixels.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// `tiny_skia` output is premultiplied, `image` output is not.
    premultiplied: bool,
}

impl LoadedImage {
    pub fn to_color_image(&self) -> egui::ColorImage {
        let size = [self.width as usize, self.height as usize];
        if self.premultiplied {
            egui::ColorImage::from_rgba_premultiplied(size, &self.pixels)
        } else {
            egui::ColorImage::from_rgba_unmultiplied(size, &self.pixels)
        }
    }
}

/// Load a screenshot or icon from disk.
pub fn load_image(path: &Path) -> Result<LoadedImage, ResourceError> {
    if !path.exists() {
        return Err(ResourceError::NotFound(path.to_path_buf()));
    }

    let is_svg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ICON_EXTENSION));

    if is_svg {
        load_svg(path, ICON_RENDER_SIZE)
    } else {
        load_raster(path)
    }
}

fn load_raster(path: &Path) -> Result<LoadedImage, ResourceError> {
    let image = image::open(path).map_err(|e| ResourceError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let rgba = image.to_rgba8();

    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
        premultiplied: false,
    })
}

/// Rasterize an SVG so it fits a `size` x `size` square.
fn load_svg(path: &Path, size: u32) -> Result<LoadedImage, ResourceError> {
    let decode_error = |message: String| ResourceError::Decode {
        path: path.to_path_buf(),
        message,
    };

    let data = std::fs::read(path)?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|e| decode_error(format!("SVG parse error: {e}")))?;

    let mut pixmap =
        tiny_skia::Pixmap::new(size, size).ok_or_else(|| decode_error("pixmap alloc failed".to_string()))?;

    let tree_size = tree.size();
    let scale = (size as f32 / tree_size.width()).min(size as f32 / tree_size.height());
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    Ok(LoadedImage {
        width: size,
        height: size,
        pixels: pixmap.take(),
        premultiplied: true,
    })
}

type LoadResult = (PathBuf, Result<LoadedImage, ResourceError>);

/// Textures keyed by file path, decoded in the background on first use.
pub struct ImageCache {
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    textures: HashMap<PathBuf, egui::TextureHandle>,
    pending: HashSet<PathBuf>,
    failed: HashSet<PathBuf>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCache {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            textures: HashMap::new(),
            pending: HashSet::new(),
            failed: HashSet::new(),
        }
    }

    /// Start decoding `path` unless it is loaded, loading or known bad.
    pub fn request(&mut self, path: &Path) {
        if self.textures.contains_key(path) || self.pending.contains(path) || self.failed.contains(path) {
            return;
        }

        let path = path.to_path_buf();
        self.pending.insert(path.clone());
        let sender = self.sender.clone();

        std::thread::spawn(move || {
            let result = load_image(&path);
            let _ = sender.send((path, result));
        });
    }

    /// Turn finished decodes into textures. Returns true if anything
    /// arrived.
    pub fn poll(&mut self, ctx: &egui::Context) -> bool {
        let mut arrived = false;

        while let Ok((path, result)) = self.receiver.try_recv() {
            self.pending.remove(&path);
            arrived = true;

            match result {
                Ok(loaded) => {
                    let texture = ctx.load_texture(
                        path.to_string_lossy(),
                        loaded.to_color_image(),
                        egui::TextureOptions::LINEAR,
                    );
                    log::debug!("Loaded image: {} ({}x{})", path.display(), loaded.width, loaded.height);
                    self.textures.insert(path, texture);
                }
                Err(e) => {
                    log::error!("Failed to load image: {}", e);
                    self.failed.insert(path);
                }
            }
        }

        arrived
    }

    pub fn texture(&self, path: &Path) -> Option<&egui::TextureHandle> {
        self.textures.get(path)
    }

    pub fn is_ready(&self, path: &Path) -> bool {
        self.textures.contains_key(path)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop a cached texture, e.g. after its file was deleted.
    pub fn forget(&mut self, path: &Path) {
        self.textures.remove(path);
        self.failed.remove(path);
    }
}
