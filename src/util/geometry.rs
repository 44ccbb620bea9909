// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module converts between native image space (the backend's pixel
//! grid) and rendered space (the on-screen rect the frame is painted into).
//! Nothing here depends on egui, so the UI can recompute every frame and
//! the maths stays testable on its own.

use crate::models::player::{BoundingBox, DetectedPlayer, ImageDimensions, Point};

/// A width/height pair in rendered (screen) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A box in rendered space, stored as origin plus size so that the size is
/// exactly the scaled native size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderedBox {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Per-axis factors that take native pixels to rendered units.
///
/// Returns `None` when either size is degenerate.
pub fn scale_factors(native: ImageDimensions, rendered: Size) -> Option<(f64, f64)> {
    if native.is_empty() || rendered.width <= 0.0 || rendered.height <= 0.0 {
        return None;
    }
    Some((
        rendered.width / native.width as f64,
        rendered.height / native.height as f64,
    ))
}

/// Scale a native bounding box into rendered space, relative to the
/// rendered image's top-left corner.
pub fn scale_box(native_box: &BoundingBox, native: ImageDimensions, rendered: Size) -> Option<RenderedBox> {
    let (sx, sy) = scale_factors(native, rendered)?;
    Some(RenderedBox {
        left: native_box.x1 * sx,
        top: native_box.y1 * sy,
        width: native_box.width() * sx,
        height: native_box.height() * sy,
    })
}

/// Map a point relative to the rendered image's top-left corner back into
/// native pixel coordinates.
pub fn to_native(rendered_point: Point, native: ImageDimensions, rendered: Size) -> Option<Point> {
    let (sx, sy) = scale_factors(native, rendered)?;
    Some(Point {
        x: rendered_point.x / sx,
        y: rendered_point.y / sy,
    })
}

/// Largest size with the native aspect ratio that fits in `available`.
pub fn fit_within(native: ImageDimensions, available: Size) -> Size {
    if native.is_empty() || available.width <= 0.0 || available.height <= 0.0 {
        return Size::new(0.0, 0.0);
    }
    let img_aspect = native.width as f64 / native.height as f64;
    let available_aspect = available.width / available.height;

    if img_aspect > available_aspect {
        // Wider than the space: fit to width
        Size::new(available.width, available.width / img_aspect)
    } else {
        Size::new(available.height * img_aspect, available.height)
    }
}

/// The player whose center is closest to `point`, with its distance.
pub fn nearest_player<'a>(players: &'a [DetectedPlayer], point: &Point) -> Option<(&'a DetectedPlayer, f64)> {
    players
        .iter()
        .map(|p| (p, p.center.distance_to(point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Id of the nearest player if its center lies strictly within `radius`
/// native pixels of `point`.
pub fn player_near(players: &[DetectedPlayer], point: &Point, radius: f64) -> Option<u32> {
    match nearest_player(players, point) {
        Some((player, distance)) if distance < radius => Some(player.id),
        _ => None,
    }
}

/// Side length of the L-shaped corner marks drawn on a rendered box.
pub fn corner_mark_size(display_width: f64, display_height: f64, selected: bool) -> f64 {
    let base = (display_width.min(display_height) * 0.1).clamp(3.0, 8.0);
    if selected {
        base * 1.2
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u32, cx: f64, cy: f64) -> DetectedPlayer {
        DetectedPlayer {
            id,
            bbox: BoundingBox::new(cx - 10.0, cy - 20.0, cx + 10.0, cy + 20.0),
            center: Point::new(cx, cy),
        }
    }

    #[test]
    fn test_scale_box_dimensions_exact() {
        let native = ImageDimensions::new(1920, 1080);
        let boxes = [
            BoundingBox::new(0.0, 0.0, 1920.0, 1080.0),
            BoundingBox::new(100.0, 200.0, 164.0, 328.0),
            BoundingBox::new(1.5, 2.25, 3.75, 9.0),
        ];
        let rendered_sizes = [
            Size::new(1920.0, 1080.0),
            Size::new(960.0, 540.0),
            Size::new(480.0, 1080.0),
            Size::new(3840.0, 2160.0),
            Size::new(1.0, 1.0),
            Size::new(777.7, 333.3),
        ];

        for native_box in &boxes {
            for rendered in &rendered_sizes {
                let (sx, sy) = scale_factors(native, *rendered).unwrap();
                let scaled = scale_box(native_box, native, *rendered).unwrap();
                assert_eq!(scaled.left, native_box.x1 * sx);
                assert_eq!(scaled.top, native_box.y1 * sy);
                assert_eq!(scaled.width, (native_box.x2 - native_box.x1) * sx);
                assert_eq!(scaled.height, (native_box.y2 - native_box.y1) * sy);
            }
        }
    }

    #[test]
    fn test_scale_box_degenerate_sizes() {
        let bbox = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        assert!(scale_box(&bbox, ImageDimensions::new(0, 1080), Size::new(10.0, 10.0)).is_none());
        assert!(scale_box(&bbox, ImageDimensions::new(10, 10), Size::new(0.0, 10.0)).is_none());
    }

    #[test]
    fn test_to_native_inverts_scaling() {
        let native = ImageDimensions::new(1280, 720);
        let rendered = Size::new(640.0, 360.0);
        let p = to_native(Point::new(320.0, 180.0), native, rendered).unwrap();
        assert!((p.x - 640.0).abs() < 1e-9);
        assert!((p.y - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_within() {
        let native = ImageDimensions::new(1920, 1080);

        // Wide space: limited by height
        let fitted = fit_within(native, Size::new(2000.0, 540.0));
        assert_eq!(fitted.height, 540.0);
        assert!((fitted.width - 960.0).abs() < 1e-9);

        // Tall space: limited by width
        let fitted = fit_within(native, Size::new(960.0, 2000.0));
        assert_eq!(fitted.width, 960.0);
        assert!((fitted.height - 540.0).abs() < 1e-9);
    }

    #[test]
    fn test_player_near_threshold() {
        let players = vec![player(1, 100.0, 100.0), player(2, 300.0, 100.0), player(3, 500.0, 400.0)];

        // Within 30px of player 2
        assert_eq!(player_near(&players, &Point::new(310.0, 120.0), 30.0), Some(2));
        // Exactly on a center
        assert_eq!(player_near(&players, &Point::new(500.0, 400.0), 30.0), Some(3));
        // Exactly 30px away is not "below" the threshold
        assert_eq!(player_near(&players, &Point::new(130.0, 100.0), 30.0), None);
        // Far from everyone
        assert_eq!(player_near(&players, &Point::new(200.0, 300.0), 30.0), None);
        // No players at all
        assert_eq!(player_near(&[], &Point::new(0.0, 0.0), 30.0), None);
    }

    #[test]
    fn test_nearest_player_picks_closest() {
        let players = vec![player(1, 0.0, 0.0), player(2, 10.0, 0.0)];
        let (nearest, distance) = nearest_player(&players, &Point::new(8.0, 0.0)).unwrap();
        assert_eq!(nearest.id, 2);
        assert_eq!(distance, 2.0);
    }

    #[test]
    fn test_corner_mark_size_clamped() {
        assert_eq!(corner_mark_size(10.0, 10.0, false), 3.0);
        assert_eq!(corner_mark_size(50.0, 60.0, false), 5.0);
        assert_eq!(corner_mark_size(500.0, 600.0, false), 8.0);
        assert!((corner_mark_size(500.0, 600.0, true) - 9.6).abs() < 1e-9);
    }
}
