// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Storage, resources, image decoding and dialogs.

pub mod dialog;
pub mod media;
pub mod repository;
pub mod resources;
pub mod serialization;
