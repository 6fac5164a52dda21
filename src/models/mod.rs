// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene data model: objects, layers, factories and maps.

pub mod factory;
pub mod layer;
pub mod map;
pub mod scene;
