// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame selector.
//!
//! A scrubber over the video's duration (or a plain number field when the
//! duration could not be read) and the button that sends the chosen frame
//! off for player detection.

use crate::models::video::format_file_size;
use std::time::Duration;

/// Result of frame selector interaction.
pub enum TimelineAction {
    None,
    SetTime(f64),
    Confirm,
    DismissError,
}

/// Read-only state the frame selector draws from.
pub struct TimelineView<'a> {
    pub file_name: &'a str,
    pub size_bytes: u64,
    pub duration: Option<f64>,
    pub timestamp: f64,
    /// Elapsed time of the in-flight frame analysis, if any.
    pub busy: Option<Duration>,
    pub backend_available: bool,
    pub error: Option<&'a str>,
    pub preview: Option<&'a egui::TextureHandle>,
}

/// Format seconds as `m:ss`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Display the frame selector.
pub fn show(ui: &mut egui::Ui, view: &TimelineView) -> TimelineAction {
    let mut action = TimelineAction::None;

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(view.file_name).strong());
        ui.label(egui::RichText::new(format_file_size(view.size_bytes)).weak());
    });
    ui.separator();

    if let Some(texture) = view.preview {
        let size = texture.size_vec2();
        let available = egui::vec2(ui.available_width(), ui.available_height() * 0.6);
        let scale = (available.x / size.x).min(available.y / size.y).min(1.0);
        ui.vertical_centered(|ui| {
            ui.image((texture.id(), size * scale));
        });
        ui.add_space(8.0);
    }

    ui.vertical_centered(|ui| {
        ui.label(
            egui::RichText::new(format_timestamp(view.timestamp))
                .size(20.0)
                .strong(),
        );
    });
    ui.add_space(4.0);

    let mut time = view.timestamp;
    let editable = view.busy.is_none();
    match view.duration {
        Some(duration) => {
            ui.spacing_mut().slider_width = (ui.available_width() - 80.0).max(100.0);
            let response = ui.add_enabled(
                editable,
                egui::Slider::new(&mut time, 0.0..=duration)
                    .step_by(0.1)
                    .show_value(false),
            );
            if response.changed() {
                action = TimelineAction::SetTime(time);
            }
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("0:00").small().weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(format_timestamp(duration)).small().weak());
                });
            });
        }
        None => {
            ui.horizontal(|ui| {
                ui.label("Time (seconds):");
                let response = ui.add_enabled(
                    editable,
                    egui::DragValue::new(&mut time).speed(0.1).max_decimals(1),
                );
                if response.changed() {
                    action = TimelineAction::SetTime(time);
                }
            });
            ui.label(
                egui::RichText::new("Video length unknown; enter the time of the frame to analyze.")
                    .small()
                    .weak(),
            );
        }
    }

    ui.add_space(12.0);
    ui.vertical_centered(|ui| {
        if let Some(elapsed) = view.busy {
            super::busy_indicator(ui, "Detecting players", Some(elapsed));
        } else {
            let button = ui
                .add_enabled(
                    view.backend_available,
                    egui::Button::new("Analyze this frame").min_size(egui::vec2(180.0, 32.0)),
                )
                .on_disabled_hover_text("The analysis server is offline");
            if button.clicked() {
                action = TimelineAction::Confirm;
            }
        }
    });

    if let Some(message) = view.error {
        ui.add_space(8.0);
        if super::dismissible_error(ui, message) {
            action = TimelineAction::DismissError;
        }
    }

    action
}
