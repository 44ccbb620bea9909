// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Wizard controller.
//!
//! Owns the current step and every piece of state that crosses steps: the
//! chosen video, the timestamp, the detection result, the selected player,
//! the optional player details and the finished report. Stages never mutate
//! this directly; they return intents that the app applies through the
//! methods below. Replacing the video or re-running detection clears
//! everything downstream so a report can never refer to another
//! frame or player.

use crate::config::AnalysisConfig;
use crate::models::analysis::{AnalysisResult, PlayerMetadata};
use crate::models::player::{DetectionResult, Point};
use crate::models::video::{UploadPart, VideoSelection};
use crate::prompt::{build_prompt, PromptContext};
use crate::util::geometry;

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    SelectFrame,
    SelectPlayer,
    AiAnalysis,
    Result,
}

impl Step {
    /// Steps shown in the progress indicator.
    pub const ALL: [Step; 5] = [
        Step::Upload,
        Step::SelectFrame,
        Step::SelectPlayer,
        Step::AiAnalysis,
        Step::Result,
    ];

    pub fn previous(self) -> Option<Step> {
        match self {
            Step::Upload => None,
            Step::SelectFrame => Some(Step::Upload),
            Step::SelectPlayer => Some(Step::SelectFrame),
            Step::AiAnalysis => Some(Step::SelectPlayer),
            Step::Result => Some(Step::AiAnalysis),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Upload => "Upload video",
            Step::SelectFrame => "Select frame",
            Step::SelectPlayer => "Select player",
            Step::AiAnalysis => "AI analysis",
            Step::Result => "Report",
        }
    }
}

/// Backend reachability as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Checking,
    Online,
    Offline,
}

/// An intent that does not fit the current state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("{action} is not available on the {step:?} step")]
    WrongStep { action: &'static str, step: Step },

    #[error("Please choose a video first")]
    NoVideo,

    #[error("Please analyze a frame first")]
    NoDetection,

    #[error("Please select a player first")]
    NoPlayer,

    #[error("There is no player #{0} in this frame")]
    UnknownPlayer(u32),
}

/// Where a back action leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Moved(Step),
    Exit,
}

/// Everything a worker needs for `analyze_frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRequest {
    pub video: UploadPart,
    pub time_in_seconds: f64,
}

/// Everything a worker needs for `analyze_with_ai`.
#[derive(Debug, Clone, PartialEq)]
pub struct AiRequest {
    pub video: UploadPart,
    pub time_in_seconds: f64,
    pub player_id: u32,
    pub player_coordinates: Point,
    pub prompt: String,
}

/// The wizard's single state container.
#[derive(Debug)]
pub struct WizardController {
    step: Step,
    video: Option<VideoSelection>,
    timestamp: f64,
    detection: Option<DetectionResult>,
    selected_player: Option<u32>,
    metadata: PlayerMetadata,
    result: Option<AnalysisResult>,
    server_status: ServerStatus,
    upload_error: Option<String>,
    frame_error: Option<String>,
    analysis_error: Option<String>,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            step: Step::Upload,
            video: None,
            timestamp: 0.0,
            detection: None,
            selected_player: None,
            metadata: PlayerMetadata::default(),
            result: None,
            server_status: ServerStatus::Checking,
            upload_error: None,
            frame_error: None,
            analysis_error: None,
        }
    }

    fn expect_step(&self, expected: Step, action: &'static str) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                action,
                step: self.step,
            })
        }
    }

    fn go_to(&mut self, step: Step) {
        if self.step != step {
            log::info!("Wizard: {:?} -> {:?}", self.step, step);
            self.step = step;
        }
    }

    // ----- read access -----

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn video(&self) -> Option<&VideoSelection> {
        self.video.as_ref()
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Best known video duration: local probe first, then the backend's.
    pub fn duration(&self) -> Option<f64> {
        self.video
            .as_ref()
            .and_then(|v| v.duration())
            .or_else(|| self.detection.as_ref().and_then(|d| d.video_duration))
    }

    pub fn detection(&self) -> Option<&DetectionResult> {
        self.detection.as_ref()
    }

    pub fn selected_player(&self) -> Option<u32> {
        self.selected_player
    }

    pub fn metadata(&self) -> &PlayerMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut PlayerMetadata {
        &mut self.metadata
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn server_status(&self) -> ServerStatus {
        self.server_status
    }

    pub fn upload_error(&self) -> Option<&str> {
        self.upload_error.as_deref()
    }

    pub fn frame_error(&self) -> Option<&str> {
        self.frame_error.as_deref()
    }

    pub fn analysis_error(&self) -> Option<&str> {
        self.analysis_error.as_deref()
    }

    // ----- connectivity -----

    pub fn set_server_status(&mut self, status: ServerStatus) {
        if self.server_status != status {
            log::info!("Server status: {:?}", status);
        }
        self.server_status = status;
    }

    /// Backend actions are disabled only once we know the server is down.
    pub fn backend_available(&self) -> bool {
        self.server_status != ServerStatus::Offline
    }

    // ----- upload -----

    pub fn set_upload_error(&mut self, message: impl Into<String>) {
        self.upload_error = Some(message.into());
    }

    pub fn clear_upload_error(&mut self) {
        self.upload_error = None;
    }

    /// Take ownership of a validated video and move on to frame selection.
    ///
    /// The previous selection (and its playback source) is released and all
    /// downstream state is cleared.
    pub fn accept_video(&mut self, video: VideoSelection) -> Result<(), WizardError> {
        self.expect_step(Step::Upload, "choosing a video")?;

        self.timestamp = video.duration().map(|d| d / 2.0).unwrap_or(0.0);
        log::info!("Video selected: {}", video.file_name);
        self.video = Some(video);
        self.detection = None;
        self.selected_player = None;
        self.metadata = PlayerMetadata::default();
        self.result = None;
        self.upload_error = None;
        self.frame_error = None;
        self.analysis_error = None;
        self.go_to(Step::SelectFrame);
        Ok(())
    }

    // ----- frame selection -----

    /// Move the scrub position, clamped to the video.
    pub fn set_timestamp(&mut self, seconds: f64) {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.timestamp = match self.duration() {
            Some(duration) => seconds.min(duration),
            None => seconds,
        };
    }

    pub fn request_frame_analysis(&mut self) -> Result<FrameRequest, WizardError> {
        self.expect_step(Step::SelectFrame, "frame analysis")?;
        let video = self.video.as_ref().ok_or(WizardError::NoVideo)?;
        self.frame_error = None;
        Ok(FrameRequest {
            video: video.upload_part(),
            time_in_seconds: self.timestamp,
        })
    }

    pub fn frame_analysis_succeeded(&mut self, detection: DetectionResult) -> Result<(), WizardError> {
        self.expect_step(Step::SelectFrame, "a frame analysis result")?;
        log::info!(
            "Detected {} players in {}x{} frame",
            detection.players.len(),
            detection.image_dimensions.width,
            detection.image_dimensions.height
        );
        self.detection = Some(detection);
        self.selected_player = None;
        self.result = None;
        self.analysis_error = None;
        self.go_to(Step::SelectPlayer);
        Ok(())
    }

    pub fn frame_analysis_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("Frame analysis failed: {}", message);
        self.frame_error = Some(message);
    }

    pub fn dismiss_frame_error(&mut self) {
        self.frame_error = None;
    }

    /// Fill in the frame size once the image itself has been decoded, for
    /// backends that did not report it.
    pub fn fill_image_dimensions(&mut self, width: u32, height: u32) {
        if let Some(detection) = &mut self.detection {
            if detection.image_dimensions.is_empty() {
                detection.image_dimensions.width = width;
                detection.image_dimensions.height = height;
            }
        }
    }

    // ----- player selection -----

    /// Toggle `player_id`. Returns the player's center when it ends up
    /// selected, `None` when the selection was cleared.
    pub fn toggle_player(&mut self, player_id: u32) -> Result<Option<Point>, WizardError> {
        self.expect_step(Step::SelectPlayer, "selecting a player")?;
        let detection = self.detection.as_ref().ok_or(WizardError::NoDetection)?;
        let player = detection
            .player(player_id)
            .ok_or(WizardError::UnknownPlayer(player_id))?;
        let center = player.center;

        self.result = None;
        if self.selected_player == Some(player_id) {
            log::info!("Deselected player #{}", player_id);
            self.selected_player = None;
            Ok(None)
        } else {
            log::info!("Selected player #{} at ({}, {})", player_id, center.x, center.y);
            self.selected_player = Some(player_id);
            Ok(Some(center))
        }
    }

    /// Handle a click on the frame away from any box. Toggles the nearest
    /// player if its center is within `radius` native pixels.
    pub fn click_near(&mut self, native_point: Point, radius: f64) -> Result<Option<u32>, WizardError> {
        self.expect_step(Step::SelectPlayer, "selecting a player")?;
        let detection = self.detection.as_ref().ok_or(WizardError::NoDetection)?;
        match geometry::player_near(&detection.players, &native_point, radius) {
            Some(id) => {
                self.toggle_player(id)?;
                Ok(Some(id))
            }
            None => {
                log::debug!("Click at ({:.1}, {:.1}) is not near any player", native_point.x, native_point.y);
                Ok(None)
            }
        }
    }

    pub fn confirm_player(&mut self) -> Result<(), WizardError> {
        self.expect_step(Step::SelectPlayer, "confirming a player")?;
        if self.selected_player.is_none() {
            return Err(WizardError::NoPlayer);
        }
        self.go_to(Step::AiAnalysis);
        Ok(())
    }

    // ----- AI analysis -----

    /// The prompt that would be sent for the current selection and details.
    pub fn prompt_text(&self, config: &AnalysisConfig) -> Result<String, WizardError> {
        let detection = self.detection.as_ref().ok_or(WizardError::NoDetection)?;
        let player_id = self.selected_player.ok_or(WizardError::NoPlayer)?;
        let player = detection
            .player(player_id)
            .ok_or(WizardError::UnknownPlayer(player_id))?;
        let fps = self
            .video
            .as_ref()
            .and_then(|v| v.metadata.fps)
            .filter(|f| f.is_finite() && *f > 0.0)
            .unwrap_or(config.assumed_fps);

        Ok(build_prompt(&PromptContext {
            player,
            timestamp_secs: self.timestamp,
            fps,
            metadata: &self.metadata,
            language: &config.report_language,
        }))
    }

    pub fn request_ai_analysis(&mut self, config: &AnalysisConfig) -> Result<AiRequest, WizardError> {
        self.expect_step(Step::AiAnalysis, "AI analysis")?;
        let video = self.video.as_ref().ok_or(WizardError::NoVideo)?;
        let prompt = self.prompt_text(config)?;
        let player_id = self.selected_player.ok_or(WizardError::NoPlayer)?;
        let player_coordinates = self
            .detection
            .as_ref()
            .and_then(|d| d.player(player_id))
            .map(|p| p.center)
            .ok_or(WizardError::UnknownPlayer(player_id))?;

        let request = AiRequest {
            video: video.upload_part(),
            time_in_seconds: self.timestamp,
            player_id,
            player_coordinates,
            prompt,
        };
        self.analysis_error = None;
        Ok(request)
    }

    pub fn ai_analysis_succeeded(&mut self, request: &AiRequest, report_text: String) -> Result<(), WizardError> {
        self.expect_step(Step::AiAnalysis, "an AI analysis result")?;
        let detection = self.detection.as_ref().ok_or(WizardError::NoDetection)?;
        if self.selected_player != Some(request.player_id) {
            return Err(WizardError::NoPlayer);
        }

        self.result = Some(AnalysisResult {
            report_text,
            prompt_text: request.prompt.clone(),
            selected_player_id: request.player_id,
            annotated_frame_url: detection.annotated_frame_url.clone(),
            players: detection.players.clone(),
            image_dimensions: detection.image_dimensions,
            timestamp_secs: request.time_in_seconds,
            metadata: self.metadata.clone(),
        });
        self.go_to(Step::Result);
        Ok(())
    }

    pub fn ai_analysis_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("AI analysis failed: {}", message);
        self.analysis_error = Some(message);
    }

    pub fn dismiss_analysis_error(&mut self) {
        self.analysis_error = None;
    }

    // ----- navigation -----

    /// Go back one step. Back from the first step leaves the wizard.
    pub fn back(&mut self) -> BackOutcome {
        match self.step.previous() {
            Some(previous) => {
                self.frame_error = None;
                self.analysis_error = None;
                self.go_to(previous);
                BackOutcome::Moved(previous)
            }
            None => {
                log::info!("Wizard: back from {:?}, exiting", self.step);
                BackOutcome::Exit
            }
        }
    }

    /// Drop everything and return to the upload step.
    pub fn start_over(&mut self) {
        let status = self.server_status;
        *self = Self::new();
        self.server_status = status;
        log::info!("Wizard reset");
    }
}
