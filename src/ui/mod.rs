// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the map board.

pub mod canvas;
pub mod map_list;
pub mod toolbar;
