// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detected player data structures.
//!
//! All coordinates in this module are in native image space: pixels of the
//! annotated frame as the backend produced it, independent of how large the
//! frame is drawn on screen.

use serde::{Deserialize, Serialize};

/// A 2D point in native pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned box given by its top-left and bottom-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// True when the corners are strictly ordered on both axes.
    pub fn is_well_formed(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }
}

/// Native pixel size of the annotated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero-sized frames cannot be scaled against.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One player found by the backend's detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPlayer {
    pub id: u32,
    pub bbox: BoundingBox,
    pub center: Point,
}

/// Everything one "analyze frame" call produced.
///
/// Replaced as a whole by the next call; never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub annotated_frame_url: String,
    pub players: Vec<DetectedPlayer>,
    pub image_dimensions: ImageDimensions,
    pub video_duration: Option<f64>,
    /// Timestamp the backend actually extracted, if it reported one.
    pub frame_time: Option<f64>,
}

impl DetectionResult {
    pub fn player(&self, id: u32) -> Option<&DetectedPlayer> {
        self.players.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn test_bbox_shape() {
        let bbox = BoundingBox::new(10.0, 20.0, 50.0, 120.0);
        assert_eq!(bbox.width(), 40.0);
        assert_eq!(bbox.height(), 100.0);
        assert!(bbox.is_well_formed());

        assert!(!BoundingBox::new(10.0, 20.0, 10.0, 30.0).is_well_formed());
        assert!(!BoundingBox::new(10.0, 20.0, 30.0, 5.0).is_well_formed());
    }

    #[test]
    fn test_player_lookup() {
        let result = DetectionResult {
            annotated_frame_url: "http://example.test/frame.jpg".to_string(),
            players: vec![
                DetectedPlayer {
                    id: 1,
                    bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                    center: Point::new(5.0, 5.0),
                },
                DetectedPlayer {
                    id: 7,
                    bbox: BoundingBox::new(20.0, 20.0, 40.0, 60.0),
                    center: Point::new(30.0, 40.0),
                },
            ],
            image_dimensions: ImageDimensions::new(640, 360),
            video_duration: None,
            frame_time: None,
        };

        assert_eq!(result.player(7).map(|p| p.center), Some(Point::new(30.0, 40.0)));
        assert!(result.player(3).is_none());
    }
}
