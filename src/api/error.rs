// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

/// Error type for backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never got a response (connection refused, DNS, timeout).
    #[error("Could not reach the analysis server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },

    /// The server answered `success: false`.
    #[error("{0}")]
    Backend(String),

    /// The response body was not what we expect.
    #[error("Unexpected response from the analysis server: {0}")]
    Decode(String),

    /// The video could not be attached to the request.
    #[error("Could not read the video file: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// True when the failure says the backend is unreachable rather than
    /// unhappy with this particular request.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Transport(e) if e.is_connect() || e.is_timeout())
    }
}
