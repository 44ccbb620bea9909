// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! HTTP client for the detection and analysis backend.

pub mod client;
pub mod error;
pub mod wire;

pub use client::ApiClient;
pub use error::ApiError;
pub use wire::HealthStatus;
