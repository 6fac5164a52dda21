// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Stage and per-object input handling.

pub mod interaction;
pub mod stage;
