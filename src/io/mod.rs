// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media files, upload checks and report export.

pub mod media;
pub mod serialization;
pub mod validation;
