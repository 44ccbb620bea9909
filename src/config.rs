// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings come from, in increasing precedence: built-in defaults, an
//! optional YAML file (`pitchscout.yaml` or the path in
//! `PITCHSCOUT_CONFIG`), and `PITCHSCOUT_*` environment variables, which
//! may themselves come from a `.env` file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "pitchscout.yaml";

pub const ENV_CONFIG_PATH: &str = "PITCHSCOUT_CONFIG";
pub const ENV_BACKEND_URL: &str = "PITCHSCOUT_BACKEND_URL";
pub const ENV_MAX_UPLOAD_MB: &str = "PITCHSCOUT_MAX_UPLOAD_MB";

/// What to do when the playability probe does not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeTimeoutPolicy {
    /// Accept the file and let the backend decide.
    Proceed,
    /// Treat the file as unplayable.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            // Detection and report generation both upload the whole video
            request_timeout_secs: 300,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub allowed_extensions: Vec<String>,
    /// `None` disables the size ceiling.
    pub max_upload_bytes: Option<u64>,
    pub probe_timeout_ms: u64,
    pub probe_timeout_policy: ProbeTimeoutPolicy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: ["mp4", "avi", "mov", "wmv", "flv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_upload_bytes: Some(100 * 1024 * 1024),
            probe_timeout_ms: 5000,
            probe_timeout_policy: ProbeTimeoutPolicy::Proceed,
        }
    }
}

impl UploadConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Click-near-a-player radius, in native image pixels.
    pub click_radius_px: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { click_radius_px: 30.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub report_language: String,
    /// Frame rate used for frame indices when the probe found none.
    pub assumed_fps: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            report_language: "Simplified Chinese".to_string(),
            assumed_fps: 30.0,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub upload: UploadConfig,
    pub detection: DetectionConfig,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_yaml_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_yaml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML config file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|u| !u.trim().is_empty()) {
            self.backend.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_MAX_UPLOAD_MB) {
            let mb: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of MB, got {:?}", ENV_MAX_UPLOAD_MB, raw))?;
            self.upload.max_upload_bytes = if mb == 0 {
                None
            } else {
                let bytes = mb
                    .checked_mul(1024 * 1024)
                    .with_context(|| format!("{} is too large: {} MB", ENV_MAX_UPLOAD_MB, mb))?;
                Some(bytes)
            };
        }
        self.backend.base_url = self.backend.base_url.trim_end_matches('/').to_string();
        Ok(())
    }
}
