// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Analysis report export.
//!
//! This module writes a finished analysis (report, prompt, and the player
//! data it refers to) to YAML or JSON.

use crate::models::analysis::AnalysisResult;
use anyhow::Result;
use std::path::Path;

/// Export an analysis result to YAML format.
pub fn export_yaml(data: &AnalysisResult, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export an analysis result to JSON format.
pub fn export_json(data: &AnalysisResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Export using the format implied by the file extension.
pub fn export_report(data: &AnalysisResult, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    match extension.as_deref() {
        Some("yaml") | Some("yml") => export_yaml(data, path),
        Some("json") => export_json(data, path),
        other => anyhow::bail!("Unsupported file extension: {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::PlayerMetadata;
    use crate::models::player::{BoundingBox, DetectedPlayer, ImageDimensions, Point};

    fn sample() -> AnalysisResult {
        AnalysisResult {
            report_text: "1. Behavior analysis\nHolds the width.".to_string(),
            prompt_text: "Analyze #2".to_string(),
            selected_player_id: 2,
            annotated_frame_url: "http://example.test/frame.jpg".to_string(),
            players: vec![DetectedPlayer {
                id: 2,
                bbox: BoundingBox::new(10.0, 20.0, 40.0, 90.0),
                center: Point::new(25.0, 55.0),
            }],
            image_dimensions: ImageDimensions::new(1280, 720),
            timestamp_secs: 12.5,
            metadata: PlayerMetadata {
                name: "Rivera".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_export_json_readable_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        export_report(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: AnalysisResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_export_yaml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.YML");
        export_report(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("selected_player_id: 2"));
        assert!(text.contains("Rivera"));
    }

    #[test]
    fn test_export_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        assert!(export_report(&sample(), &path).is_err());
        assert!(!path.exists());
    }
}
