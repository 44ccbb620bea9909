// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! AI analysis inputs and results.

use super::player::{DetectedPlayer, ImageDimensions};
use serde::{Deserialize, Serialize};

/// Optional details the user can supply to personalise the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMetadata {
    pub name: String,
    pub jersey_number: String,
    pub position: String,
    /// Free-form question appended to the prompt.
    #[serde(default)]
    pub focus: String,
}

impl PlayerMetadata {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
            && self.jersey_number.trim().is_empty()
            && self.position.trim().is_empty()
            && self.focus.trim().is_empty()
    }
}

/// Outcome of one successful AI analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub report_text: String,
    pub prompt_text: String,
    pub selected_player_id: u32,
    pub annotated_frame_url: String,
    pub players: Vec<DetectedPlayer>,
    pub image_dimensions: ImageDimensions,
    pub timestamp_secs: f64,
    pub metadata: PlayerMetadata,
}

impl AnalysisResult {
    pub fn selected_player(&self) -> Option<&DetectedPlayer> {
        self.players.iter().find(|p| p.id == self.selected_player_id)
    }

    /// Report text split on line breaks, one entry per displayed paragraph.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.report_text.split('\n').map(|line| line.trim_end_matches('\r')).collect()
    }
}
