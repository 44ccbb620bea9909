// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Upload validation.
//!
//! Checks a candidate video file before the wizard accepts it: extension
//! allow-list, empty files, the optional size ceiling, and a bounded
//! playability probe.

use crate::config::{ProbeTimeoutPolicy, UploadConfig};
use crate::io::media::{probe_with_timeout, MediaProbe, ProbeOutcome};
use crate::models::video::{format_file_size, Container, VideoMetadata, VideoSelection};
use std::path::Path;
use std::sync::Arc;

/// Why a file was refused at the upload stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file format. Please upload one of: {}", .allowed.join(", ").to_uppercase())]
    UnsupportedFormat { allowed: Vec<String> },

    #[error("The file is empty, please choose a valid video file")]
    Empty,

    #[error("File size {} exceeds the {} limit", format_file_size(*.size), format_file_size(*.limit))]
    TooLarge { size: u64, limit: u64 },

    #[error("Could not read the file: {0}")]
    Unreadable(String),

    #[error("This video cannot be played, the file may be damaged: {0}")]
    Unplayable(String),

    #[error("Timed out while checking the video")]
    ProbeTimedOut,
}

/// Lower-cased extension of a file name, if it has one.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Check name and size against the configured rules.
///
/// Returns the container implied by the extension.
pub fn validate_candidate(file_name: &str, size_bytes: u64, config: &UploadConfig) -> Result<Container, UploadError> {
    let unsupported = || UploadError::UnsupportedFormat {
        allowed: config.allowed_extensions.clone(),
    };

    let extension = file_extension(file_name).ok_or_else(unsupported)?;
    let allowed = config
        .allowed_extensions
        .iter()
        .any(|a| a.eq_ignore_ascii_case(&extension));
    if !allowed {
        return Err(unsupported());
    }
    let container = Container::from_extension(&extension).ok_or_else(unsupported)?;

    if let Some(limit) = config.max_upload_bytes {
        if size_bytes > limit {
            return Err(UploadError::TooLarge { size: size_bytes, limit });
        }
    }

    if size_bytes == 0 {
        return Err(UploadError::Empty);
    }

    Ok(container)
}

/// Validate a file on disk and, if it passes, build the selection the
/// wizard will own. Blocks for up to the configured probe timeout.
pub fn admit_upload(path: &Path, config: &UploadConfig, probe: Arc<dyn MediaProbe>) -> Result<VideoSelection, UploadError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| UploadError::Unreadable(format!("invalid file name: {}", path.display())))?;

    let size_bytes = std::fs::metadata(path)
        .map_err(|e| UploadError::Unreadable(e.to_string()))?
        .len();

    log::info!("Validating {} ({})", file_name, format_file_size(size_bytes));

    let container = validate_candidate(&file_name, size_bytes, config).map_err(|e| {
        log::warn!("Rejected {}: {}", file_name, e);
        e
    })?;

    let metadata = match probe_with_timeout(probe, path, container, config.probe_timeout())? {
        ProbeOutcome::Playable(metadata) => metadata,
        ProbeOutcome::TimedOut => match config.probe_timeout_policy {
            ProbeTimeoutPolicy::Proceed => {
                log::warn!("Probe of {} timed out, accepting and letting the backend decide", file_name);
                VideoMetadata::default()
            }
            ProbeTimeoutPolicy::Reject => {
                log::warn!("Probe of {} timed out, rejecting", file_name);
                return Err(UploadError::ProbeTimedOut);
            }
        },
    };

    log::info!(
        "Accepted {} (duration: {:?}s, fps: {:?})",
        file_name,
        metadata.duration_secs,
        metadata.fps
    );

    Ok(VideoSelection::new(
        path.to_path_buf(),
        file_name,
        size_bytes,
        container,
        metadata,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FixedProbe(Result<VideoMetadata, UploadError>);

    impl MediaProbe for FixedProbe {
        fn probe(&self, _path: &Path, _container: Container) -> Result<VideoMetadata, UploadError> {
            self.0.clone()
        }
    }

    struct SlowProbe;

    impl MediaProbe for SlowProbe {
        fn probe(&self, _path: &Path, _container: Container) -> Result<VideoMetadata, UploadError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(VideoMetadata::default())
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, len: usize) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![0u8; len]).unwrap();
        path
    }

    #[test]
    fn test_allowed_extensions_case_insensitive() {
        let config = UploadConfig::default();
        for name in ["a.mp4", "b.AVI", "c.Mov", "d.wmv", "e.FLV", "match.final.mp4"] {
            assert!(validate_candidate(name, 1024, &config).is_ok(), "{name} should pass");
        }
        assert_eq!(validate_candidate("x.MP4", 10, &config), Ok(Container::Mp4));
    }

    #[test]
    fn test_other_extensions_rejected() {
        let config = UploadConfig::default();
        for name in ["clip.mkv", "clip.webm", "notes.txt", "noextension", "mp4", ".mp4x"] {
            assert!(
                matches!(
                    validate_candidate(name, 1024, &config),
                    Err(UploadError::UnsupportedFormat { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_narrowed_allow_list() {
        let config = UploadConfig {
            allowed_extensions: vec!["mp4".to_string()],
            ..UploadConfig::default()
        };
        assert!(validate_candidate("a.mp4", 1, &config).is_ok());
        assert!(validate_candidate("a.avi", 1, &config).is_err());
    }

    #[test]
    fn test_zero_byte_always_rejected() {
        let config = UploadConfig::default();
        assert_eq!(validate_candidate("match.mp4", 0, &config), Err(UploadError::Empty));

        let no_ceiling = UploadConfig {
            max_upload_bytes: None,
            ..UploadConfig::default()
        };
        assert_eq!(validate_candidate("match.mov", 0, &no_ceiling), Err(UploadError::Empty));
        assert!(validate_candidate("match.txt", 0, &no_ceiling).is_err());
    }

    #[test]
    fn test_size_ceiling() {
        let config = UploadConfig::default();
        let limit = 100 * 1024 * 1024;
        assert!(validate_candidate("big.mp4", limit, &config).is_ok());
        assert_eq!(
            validate_candidate("big.mp4", limit + 1, &config),
            Err(UploadError::TooLarge { size: limit + 1, limit })
        );

        let no_ceiling = UploadConfig {
            max_upload_bytes: None,
            ..UploadConfig::default()
        };
        assert!(validate_candidate("big.mp4", limit * 10, &no_ceiling).is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = UploadError::UnsupportedFormat {
            allowed: vec!["mp4".to_string(), "avi".to_string()],
        };
        assert_eq!(err.to_string(), "Unsupported file format. Please upload one of: MP4, AVI");

        let err = UploadError::TooLarge { size: 200 * 1024 * 1024, limit: 100 * 1024 * 1024 };
        assert_eq!(err.to_string(), "File size 200 MB exceeds the 100 MB limit");
    }

    #[test]
    fn test_admit_upload_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "match.mp4", 5 * 1024);
        let metadata = VideoMetadata {
            duration_secs: Some(30.0),
            ..Default::default()
        };
        let selection = admit_upload(&path, &UploadConfig::default(), Arc::new(FixedProbe(Ok(metadata)))).unwrap();
        assert_eq!(selection.file_name, "match.mp4");
        assert_eq!(selection.size_bytes, 5 * 1024);
        assert_eq!(selection.duration(), Some(30.0));
    }

    #[test]
    fn test_admit_upload_unplayable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.avi", 64);
        let probe = FixedProbe(Err(UploadError::Unplayable("bad header".to_string())));
        let err = admit_upload(&path, &UploadConfig::default(), Arc::new(probe)).unwrap_err();
        assert!(matches!(err, UploadError::Unplayable(_)));
    }

    #[test]
    fn test_admit_upload_timeout_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "slow.mp4", 64);

        let proceed = UploadConfig {
            probe_timeout_ms: 20,
            ..UploadConfig::default()
        };
        let selection = admit_upload(&path, &proceed, Arc::new(SlowProbe)).unwrap();
        assert_eq!(selection.metadata, VideoMetadata::default());

        let reject = UploadConfig {
            probe_timeout_ms: 20,
            probe_timeout_policy: ProbeTimeoutPolicy::Reject,
            ..UploadConfig::default()
        };
        let err = admit_upload(&path, &reject, Arc::new(SlowProbe)).unwrap_err();
        assert_eq!(err, UploadError::ProbeTimedOut);
    }

    #[test]
    fn test_admit_upload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.mp4");
        let err = admit_upload(&path, &UploadConfig::default(), Arc::new(SlowProbe)).unwrap_err();
        assert!(matches!(err, UploadError::Unreadable(_)));
    }
}
