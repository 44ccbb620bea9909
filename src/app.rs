// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! `ScoutApp` is the egui shell around the wizard controller. It owns the
//! backend client and the background job slots, draws the stage for the
//! current step, and turns stage actions into controller calls and jobs.

use crate::api::{ApiClient, ApiError, HealthStatus};
use crate::config::AppConfig;
use crate::io::media::{self, LoadedImage, MediaProbe};
use crate::io::validation::{self, UploadError};
use crate::jobs::JobSlot;
use crate::models::player::DetectionResult;
use crate::models::video::VideoSelection;
use crate::ui::{analysis, canvas, players, result, timeline, toolbar, upload};
use crate::wizard::{AiRequest, BackOutcome, ServerStatus, Step, WizardController};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Scrubbing must pause this long before a preview frame is decoded.
const PREVIEW_DEBOUNCE: Duration = Duration::from_millis(300);

/// Detection plus the decoded annotated frame.
struct FrameData {
    detection: DetectionResult,
    image: LoadedImage,
}

/// Main application state.
pub struct ScoutApp {
    config: AppConfig,
    client: ApiClient,
    probe: Arc<dyn MediaProbe>,
    wizard: WizardController,

    /// Annotated frame for the current detection
    frame_texture: Option<egui::TextureHandle>,
    /// Locally decoded frame at the scrub position
    preview_texture: Option<egui::TextureHandle>,
    /// Scrub position waiting for a preview, and when it last changed
    preview_wanted: Option<(f64, Instant)>,
    /// File currently being validated
    validating: Option<String>,
    /// The AI request in flight, kept to build the result
    pending_ai: Option<AiRequest>,
    show_prompt: bool,
    /// Transient status-bar message (e.g. "Report saved")
    notice: Option<String>,

    upload_job: JobSlot<Result<VideoSelection, UploadError>>,
    health_job: JobSlot<Result<HealthStatus, ApiError>>,
    frame_job: JobSlot<Result<FrameData, ApiError>>,
    ai_job: JobSlot<Result<String, ApiError>>,
    preview_job: JobSlot<Result<LoadedImage, String>>,
}

impl ScoutApp {
    /// Create the app and kick off the first health check.
    pub fn new(config: AppConfig, client: ApiClient) -> Self {
        let mut app = Self {
            config,
            client,
            probe: media::default_probe(),
            wizard: WizardController::new(),
            frame_texture: None,
            preview_texture: None,
            preview_wanted: None,
            validating: None,
            pending_ai: None,
            show_prompt: false,
            notice: None,
            upload_job: JobSlot::new(),
            health_job: JobSlot::new(),
            frame_job: JobSlot::new(),
            ai_job: JobSlot::new(),
            preview_job: JobSlot::new(),
        };
        app.check_health();
        app
    }

    fn check_health(&mut self) {
        let client = self.client.clone();
        if self.health_job.start("health check", move || client.health_check()).is_some() {
            self.wizard.set_server_status(ServerStatus::Checking);
        }
    }

    /// Validate and probe `path` in the background.
    fn choose_file(&mut self, path: PathBuf) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let config = self.config.upload.clone();
        let probe = Arc::clone(&self.probe);
        if self
            .upload_job
            .start("video validation", move || validation::admit_upload(&path, &config, probe))
            .is_some()
        {
            self.wizard.clear_upload_error();
            self.validating = Some(name);
        }
    }

    fn analyze_frame(&mut self) {
        if self.frame_job.is_running() {
            log::warn!("Frame analysis already in progress");
            return;
        }
        let request = match self.wizard.request_frame_analysis() {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Ignoring frame analysis request: {}", e);
                return;
            }
        };
        let client = self.client.clone();
        self.frame_job.start("frame analysis", move || {
            let detection = client.analyze_frame(&request.video, request.time_in_seconds)?;
            let bytes = client.fetch_image(&detection.annotated_frame_url)?;
            let image = media::decode_image(&bytes).map_err(|e| ApiError::Decode(format!("{:#}", e)))?;
            Ok(FrameData { detection, image })
        });
    }

    fn analyze_with_ai(&mut self) {
        if self.ai_job.is_running() {
            log::warn!("AI analysis already in progress");
            return;
        }
        let request = match self.wizard.request_ai_analysis(&self.config.analysis) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Ignoring AI analysis request: {}", e);
                self.wizard.ai_analysis_failed(e.to_string());
                return;
            }
        };
        let client = self.client.clone();
        let job_request = request.clone();
        self.ai_job.start("AI analysis", move || {
            client.analyze_with_ai(
                &job_request.video,
                job_request.time_in_seconds,
                job_request.player_coordinates,
                &job_request.prompt,
            )
        });
        self.pending_ai = Some(request);
    }

    #[cfg(feature = "video-opencv")]
    fn start_preview(&mut self, seconds: f64) {
        if let Some(video) = self.wizard.video() {
            let path = video.path.clone();
            self.preview_job.start("frame preview", move || {
                media::grab_frame(&path, seconds).map_err(|e| format!("{:#}", e))
            });
        }
    }

    #[cfg(not(feature = "video-opencv"))]
    fn start_preview(&mut self, _seconds: f64) {}

    /// Forget every in-flight job tied to the current video.
    fn abandon_video_jobs(&mut self) {
        self.frame_job.invalidate();
        self.ai_job.invalidate();
        self.preview_job.invalidate();
        self.pending_ai = None;
        self.preview_wanted = None;
    }

    fn connectivity_check(&mut self, error: &ApiError) {
        if error.is_connectivity() {
            self.wizard.set_server_status(ServerStatus::Offline);
        }
    }

    /// Pick up finished background work.
    fn poll_jobs(&mut self, ctx: &egui::Context) {
        if let Some(result) = self.health_job.poll() {
            match result {
                Ok(health) if health.is_healthy() => self.wizard.set_server_status(ServerStatus::Online),
                Ok(health) => {
                    log::warn!("Server reported status {:?}", health.status);
                    self.wizard.set_server_status(ServerStatus::Offline);
                }
                Err(e) => {
                    log::warn!("Health check failed: {}", e);
                    self.wizard.set_server_status(ServerStatus::Offline);
                }
            }
        }

        if let Some(result) = self.upload_job.poll() {
            self.validating = None;
            match result {
                Ok(video) => {
                    self.abandon_video_jobs();
                    self.frame_texture = None;
                    self.preview_texture = None;
                    match self.wizard.accept_video(video) {
                        Ok(()) => self.preview_wanted = Some((self.wizard.timestamp(), Instant::now())),
                        Err(e) => log::warn!("Discarding validated video: {}", e),
                    }
                }
                Err(e) => self.wizard.set_upload_error(e.to_string()),
            }
        }

        if let Some(result) = self.frame_job.poll() {
            match result {
                Ok(FrameData { detection, image }) => match self.wizard.frame_analysis_succeeded(detection) {
                    Ok(()) => {
                        self.wizard.fill_image_dimensions(image.width, image.height);
                        let size = [image.width as usize, image.height as usize];
                        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
                        self.frame_texture =
                            Some(ctx.load_texture("annotated_frame", color_image, egui::TextureOptions::LINEAR));
                    }
                    Err(e) => log::warn!("Discarding frame analysis: {}", e),
                },
                Err(e) => {
                    self.connectivity_check(&e);
                    self.wizard.frame_analysis_failed(e.to_string());
                }
            }
        }

        if let Some(result) = self.ai_job.poll() {
            let request = self.pending_ai.take();
            match (result, request) {
                (Ok(report), Some(request)) => {
                    log::info!("Received report ({} chars)", report.len());
                    if let Err(e) = self.wizard.ai_analysis_succeeded(&request, report) {
                        log::warn!("Discarding AI analysis: {}", e);
                    }
                }
                (Ok(_), None) => log::warn!("AI analysis finished with no matching request"),
                (Err(e), _) => {
                    self.connectivity_check(&e);
                    self.wizard.ai_analysis_failed(e.to_string());
                }
            }
        }

        if let Some(result) = self.preview_job.poll() {
            match result {
                Ok(image) => {
                    let size = [image.width as usize, image.height as usize];
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
                    self.preview_texture =
                        Some(ctx.load_texture("frame_preview", color_image, egui::TextureOptions::LINEAR));
                }
                Err(e) => log::debug!("No preview: {}", e),
            }
        }

        if let Some((seconds, changed)) = self.preview_wanted {
            let waited = changed.elapsed();
            if waited < PREVIEW_DEBOUNCE {
                ctx.request_repaint_after(PREVIEW_DEBOUNCE - waited);
            } else if !self.preview_job.is_running() {
                self.preview_wanted = None;
                self.start_preview(seconds);
            }
        }
    }

    fn any_job_running(&self) -> bool {
        self.upload_job.is_running()
            || self.health_job.is_running()
            || self.frame_job.is_running()
            || self.ai_job.is_running()
            || self.preview_job.is_running()
    }

    fn go_back(&mut self, ctx: &egui::Context) {
        match self.wizard.back() {
            BackOutcome::Exit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            BackOutcome::Moved(step) => {
                self.frame_job.invalidate();
                self.ai_job.invalidate();
                self.pending_ai = None;
                if step == Step::SelectFrame {
                    self.preview_wanted = Some((self.wizard.timestamp(), Instant::now()));
                }
            }
        }
    }

    fn start_over(&mut self) {
        self.abandon_video_jobs();
        self.upload_job.invalidate();
        self.validating = None;
        self.frame_texture = None;
        self.preview_texture = None;
        self.show_prompt = false;
        self.wizard.start_over();
    }

    fn show_upload(&mut self, ctx: &egui::Context) {
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                upload::show(
                    ui,
                    &self.config.upload,
                    self.validating.as_deref(),
                    self.wizard.upload_error(),
                )
            })
            .inner;

        match action {
            upload::UploadAction::Choose(path) => self.choose_file(path),
            upload::UploadAction::DismissError => self.wizard.clear_upload_error(),
            upload::UploadAction::None => {}
        }
    }

    fn show_frame_selector(&mut self, ctx: &egui::Context) {
        let Some(video) = self.wizard.video() else {
            return;
        };
        let view = timeline::TimelineView {
            file_name: &video.file_name,
            size_bytes: video.size_bytes,
            duration: self.wizard.duration(),
            timestamp: self.wizard.timestamp(),
            busy: self.frame_job.elapsed(),
            backend_available: self.wizard.backend_available(),
            error: self.wizard.frame_error(),
            preview: self.preview_texture.as_ref(),
        };
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| timeline::show(ui, &view))
            .inner;

        match action {
            timeline::TimelineAction::SetTime(seconds) => {
                self.wizard.set_timestamp(seconds);
                self.preview_wanted = Some((self.wizard.timestamp(), Instant::now()));
            }
            timeline::TimelineAction::Confirm => self.analyze_frame(),
            timeline::TimelineAction::DismissError => self.wizard.dismiss_frame_error(),
            timeline::TimelineAction::None => {}
        }
    }

    fn show_player_selection(&mut self, ctx: &egui::Context) {
        let Some(detection) = self.wizard.detection() else {
            return;
        };
        let selected = self.wizard.selected_player();

        let panel_action = egui::SidePanel::right("players")
            .default_width(220.0)
            .show(ctx, |ui| players::show(ui, &detection.players, selected))
            .inner;

        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                canvas::show(
                    ui,
                    self.frame_texture.as_ref(),
                    detection.image_dimensions,
                    &detection.players,
                    selected,
                )
            })
            .inner;

        let outcome = match (panel_action, canvas_action) {
            (players::PlayersAction::Continue, _) => self.wizard.confirm_player(),
            (players::PlayersAction::TogglePlayer(id), _) | (_, canvas::CanvasAction::TogglePlayer(id)) => {
                self.wizard.toggle_player(id).map(|_| ())
            }
            (_, canvas::CanvasAction::ClickAt(point)) => self
                .wizard
                .click_near(point, self.config.detection.click_radius_px)
                .map(|_| ()),
            (players::PlayersAction::None, canvas::CanvasAction::None) => Ok(()),
        };
        if let Err(e) = outcome {
            log::warn!("{}", e);
        }
    }

    fn show_analysis(&mut self, ctx: &egui::Context) {
        let player = self
            .wizard
            .selected_player()
            .and_then(|id| self.wizard.detection().and_then(|d| d.player(id)))
            .cloned();
        let prompt = self.wizard.prompt_text(&self.config.analysis).ok();
        let error = self.wizard.analysis_error().map(str::to_string);
        let view = analysis::AnalysisView {
            player: player.as_ref(),
            timestamp: self.wizard.timestamp(),
            prompt: prompt.as_deref(),
            busy: self.ai_job.elapsed(),
            backend_available: self.wizard.backend_available(),
            error: error.as_deref(),
        };

        let wizard = &mut self.wizard;
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .show(ui, |ui| analysis::show(ui, &view, wizard.metadata_mut()))
                    .inner
            })
            .inner;

        match action {
            analysis::AnalysisAction::Submit => self.analyze_with_ai(),
            analysis::AnalysisAction::DismissError => self.wizard.dismiss_analysis_error(),
            analysis::AnalysisAction::None => {}
        }
    }

    fn show_result(&mut self, ctx: &egui::Context) {
        let Some(report) = self.wizard.result() else {
            return;
        };
        let show_prompt = &mut self.show_prompt;
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| result::show(ui, report, self.frame_texture.as_ref(), show_prompt))
            .inner;

        match action {
            result::ResultAction::CopyReport => {
                let text = report.report_text.clone();
                ctx.output_mut(|o| o.copied_text = text);
                self.notice = Some("Report copied to clipboard".to_string());
            }
            result::ResultAction::SaveReport(path) => {
                match crate::io::serialization::export_report(report, &path) {
                    Ok(()) => {
                        log::info!("Saved report to {}", path.display());
                        self.notice = Some(format!("Saved {}", path.display()));
                    }
                    Err(e) => {
                        log::error!("Failed to save report: {:#}", e);
                        self.notice = Some(format!("Could not save report: {}", e));
                    }
                }
            }
            result::ResultAction::StartOver => self.start_over(),
            result::ResultAction::None => {}
        }
    }
}

impl eframe::App for ScoutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs(ctx);

        // Keep spinners and elapsed counters moving
        if self.any_job_running() {
            ctx.request_repaint();
        }

        let step = self.wizard.step();

        let (toolbar_action, banner_action, _) = toolbar::show_panels(
            ctx,
            step,
            self.validating.is_none(),
            self.wizard.server_status(),
            self.client.base_url(),
        );

        if let Some(notice) = &self.notice {
            egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
                ui.label(egui::RichText::new(notice).weak());
            });
        }

        if let toolbar::ToolbarAction::RetryHealth = banner_action {
            self.check_health();
        }

        // Escape goes back too, unless a text field has focus
        let escape = !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Escape));
        if let toolbar::ToolbarAction::Back = toolbar_action {
            self.notice = None;
            self.go_back(ctx);
        } else if escape && step != Step::Upload {
            self.go_back(ctx);
        }

        match self.wizard.step() {
            Step::Upload => self.show_upload(ctx),
            Step::SelectFrame => self.show_frame_selector(ctx),
            Step::SelectPlayer => self.show_player_selection(ctx),
            Step::AiAnalysis => self.show_analysis(ctx),
            Step::Result => self.show_result(ctx),
        }
    }
}
