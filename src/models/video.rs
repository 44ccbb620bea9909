// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The user's chosen video and what we learned about it locally.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Container formats the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Avi,
    Mov,
    Wmv,
    Flv,
}

impl Container {
    /// Map a lower-case file extension to a container.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp4" => Some(Container::Mp4),
            "avi" => Some(Container::Avi),
            "mov" => Some(Container::Mov),
            "wmv" => Some(Container::Wmv),
            "flv" => Some(Container::Flv),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Container::Mp4 => "video/mp4",
            Container::Avi => "video/x-msvideo",
            Container::Mov => "video/quicktime",
            Container::Wmv => "video/x-ms-wmv",
            Container::Flv => "video/x-flv",
        }
    }
}

/// Properties read from the file before it is sent anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub duration_secs: Option<f64>,
    pub fps: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Owned handle on the local media used for scrubbing and previews.
///
/// Exactly one exists per accepted upload. Dropping it releases the handle,
/// which happens when a new file replaces it or the app shuts down.
#[derive(Debug)]
pub struct PlaybackSource {
    id: u64,
    path: PathBuf,
}

impl PlaybackSource {
    pub fn open(path: &Path) -> Self {
        let id = NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("Opened playback source #{} for {}", id, path.display());
        Self {
            id,
            path: path.to_path_buf(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for PlaybackSource {
    fn drop(&mut self) {
        log::debug!("Released playback source #{} ({})", self.id, self.path.display());
    }
}

/// What a worker thread needs to attach the video to a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPart {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
}

/// A validated upload, owned by the wizard controller.
#[derive(Debug)]
pub struct VideoSelection {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub container: Container,
    pub metadata: VideoMetadata,
    pub playback: PlaybackSource,
}

impl VideoSelection {
    pub fn new(
        path: PathBuf,
        file_name: String,
        size_bytes: u64,
        container: Container,
        metadata: VideoMetadata,
    ) -> Self {
        let playback = PlaybackSource::open(&path);
        Self {
            path,
            file_name,
            size_bytes,
            container,
            metadata,
            playback,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        self.metadata.duration_secs.filter(|d| d.is_finite() && *d > 0.0)
    }

    pub fn upload_part(&self) -> UploadPart {
        UploadPart {
            path: self.path.clone(),
            file_name: self.file_name.clone(),
            mime_type: self.container.mime_type().to_string(),
        }
    }
}

/// Human-readable file size ("5 MB", "812.4 KB").
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
