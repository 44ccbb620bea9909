// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model shared by the wizard stages.

pub mod analysis;
pub mod player;
pub mod video;
