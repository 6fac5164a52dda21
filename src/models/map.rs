// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Named maps.
//!
//! A map is a name plus two independently stored layer documents: the
//! image layer (always present once the map exists) and the marker layer
//! (absent until the first marker change).

use crate::io::repository::RepositoryError;

/// Stored documents of one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDocuments {
    pub image_layer: String,
    pub marker_layer: Option<String>,
}

/// Validate a map name for use as a storage key.
///
/// Blank names and names that would escape the maps folder are rejected.
pub fn validate_map_name(name: &str) -> Result<&str, RepositoryError> {
    let forbidden = |c: char| matches!(c, '/' | '\\') || c.is_control();
    if name.trim().is_empty() || name.contains(forbidden) || name == "." || name == ".." {
        return Err(RepositoryError::InvalidName(name.to_string()));
    }
    Ok(name)
}
