// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! JSON shapes exchanged with the backend, and their conversion into the
//! application's model types.

use super::error::ApiError;
use crate::models::player::{BoundingBox, DetectedPlayer, DetectionResult, ImageDimensions, Point};
use serde::Deserialize;
use std::collections::HashSet;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeFrameResponse {
    #[serde(default)]
    success: bool,
    annotated_frame_url: Option<String>,
    players_data: Option<Vec<WirePlayer>>,
    image_dimensions: Option<WireDimensions>,
    video_duration: Option<f64>,
    time_in_seconds: Option<f64>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePlayer {
    id: u32,
    bbox: [f64; 4],
    center: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct WireDimensions {
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct AnalyzeWithAiResponse {
    #[serde(default)]
    success: bool,
    analysis: Option<String>,
    error: Option<String>,
}

fn backend_failure(error: Option<String>) -> ApiError {
    let message = error
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| "analysis failed".to_string());
    ApiError::Backend(message)
}

pub fn parse_health(body: &str) -> Result<HealthStatus, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Decode an `analyze_frame` response and check the player invariants:
/// unique ids and strictly ordered box corners.
pub fn parse_analyze_frame(body: &str) -> Result<DetectionResult, ApiError> {
    let response: AnalyzeFrameResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if !response.success {
        return Err(backend_failure(response.error));
    }

    let annotated_frame_url = response
        .annotated_frame_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::Decode("missing annotated_frame_url".to_string()))?;

    let mut seen = HashSet::new();
    let mut players = Vec::new();
    for wire in response.players_data.unwrap_or_default() {
        let [x1, y1, x2, y2] = wire.bbox;
        let bbox = BoundingBox::new(x1, y1, x2, y2);
        if !bbox.is_well_formed() {
            return Err(ApiError::Decode(format!("player {} has a degenerate box {:?}", wire.id, wire.bbox)));
        }
        if !seen.insert(wire.id) {
            return Err(ApiError::Decode(format!("duplicate player id {}", wire.id)));
        }
        players.push(DetectedPlayer {
            id: wire.id,
            bbox,
            center: Point::new(wire.center[0], wire.center[1]),
        });
    }

    let image_dimensions = response
        .image_dimensions
        .map(|d| ImageDimensions::new(d.width.max(0.0).round() as u32, d.height.max(0.0).round() as u32))
        .unwrap_or(ImageDimensions::new(0, 0));

    Ok(DetectionResult {
        annotated_frame_url,
        players,
        image_dimensions,
        video_duration: response.video_duration.filter(|d| d.is_finite() && *d > 0.0),
        frame_time: response.time_in_seconds,
    })
}

/// Decode an `analyze_with_gemini` response into the report text.
pub fn parse_analyze_with_ai(body: &str) -> Result<String, ApiError> {
    let response: AnalyzeWithAiResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if !response.success {
        return Err(backend_failure(response.error));
    }
    response
        .analysis
        .ok_or_else(|| ApiError::Decode("missing analysis text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_PLAYERS: &str = r#"{
        "success": true,
        "time_in_seconds": 12.48,
        "annotated_frame_url": "https://cdn.example.test/frame_analysis/1_annotated_frame.jpg",
        "players_data": [
            {"id": 1, "bbox": [100, 200, 140, 300], "center": [120, 250]},
            {"id": 2, "bbox": [400.5, 220, 450, 330], "center": [425, 275]},
            {"id": 3, "bbox": [900, 180, 940, 290], "center": [920, 235]}
        ],
        "image_dimensions": {"width": 1280, "height": 720},
        "video_duration": 95.2,
        "predictions": []
    }"#;

    #[test]
    fn test_parse_analyze_frame() {
        let result = parse_analyze_frame(THREE_PLAYERS).unwrap();
        assert_eq!(result.players.len(), 3);
        assert_eq!(result.image_dimensions, ImageDimensions::new(1280, 720));
        assert_eq!(result.video_duration, Some(95.2));
        assert_eq!(result.frame_time, Some(12.48));

        let p2 = result.player(2).unwrap();
        assert_eq!(p2.bbox, BoundingBox::new(400.5, 220.0, 450.0, 330.0));
        assert_eq!(p2.center, Point::new(425.0, 275.0));
    }

    #[test]
    fn test_parse_analyze_frame_null_players() {
        let body = r#"{"success": true, "annotated_frame_url": "u", "players_data": null}"#;
        let result = parse_analyze_frame(body).unwrap();
        assert!(result.players.is_empty());
        assert!(result.image_dimensions.is_empty());
        assert_eq!(result.video_duration, None);
    }

    #[test]
    fn test_parse_analyze_frame_backend_failure() {
        let body = r#"{"success": false, "error": "Failed to extract frame from video"}"#;
        let err = parse_analyze_frame(body).unwrap_err();
        assert!(matches!(err, ApiError::Backend(ref m) if m == "Failed to extract frame from video"));

        let err = parse_analyze_frame(r#"{"error": ""}"#).unwrap_err();
        assert!(matches!(err, ApiError::Backend(ref m) if m == "analysis failed"));
    }

    #[test]
    fn test_parse_analyze_frame_rejects_bad_players() {
        let duplicate = r#"{"success": true, "annotated_frame_url": "u", "players_data": [
            {"id": 1, "bbox": [0, 0, 10, 10], "center": [5, 5]},
            {"id": 1, "bbox": [20, 20, 30, 30], "center": [25, 25]}
        ]}"#;
        assert!(matches!(parse_analyze_frame(duplicate), Err(ApiError::Decode(_))));

        let degenerate = r#"{"success": true, "annotated_frame_url": "u", "players_data": [
            {"id": 1, "bbox": [10, 0, 10, 10], "center": [10, 5]}
        ]}"#;
        assert!(matches!(parse_analyze_frame(degenerate), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_parse_analyze_frame_malformed() {
        assert!(matches!(parse_analyze_frame("<html>oops</html>"), Err(ApiError::Decode(_))));
        assert!(matches!(
            parse_analyze_frame(r#"{"success": true}"#),
            Err(ApiError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_analyze_with_ai() {
        let ok = r#"{"success": true, "analysis": "Line one\nLine two", "timestamp": "20250101_120000"}"#;
        assert_eq!(parse_analyze_with_ai(ok).unwrap(), "Line one\nLine two");

        let failed = r#"{"success": false, "error": "quota exceeded"}"#;
        assert!(matches!(parse_analyze_with_ai(failed), Err(ApiError::Backend(ref m)) if m == "quota exceeded"));

        let missing = r#"{"success": true}"#;
        assert!(matches!(parse_analyze_with_ai(missing), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_health() {
        let healthy = parse_health(r#"{"status": "healthy", "gemini_enabled": true}"#).unwrap();
        assert!(healthy.is_healthy());
        let degraded = parse_health(r#"{"status": "degraded"}"#).unwrap();
        assert!(!degraded.is_healthy());
    }
}
