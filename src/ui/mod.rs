// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI stages for the PitchScout wizard.
//!
//! Each stage draws itself from read-only state and returns an action enum.
//! The app applies actions to the wizard controller; stages never touch the
//! network or the controller directly.

pub mod analysis;
pub mod canvas;
pub mod players;
pub mod result;
pub mod timeline;
pub mod toolbar;
pub mod upload;

/// Spinner plus "{message} (12s)" line shown while a job is in flight.
pub fn busy_indicator(ui: &mut egui::Ui, message: &str, elapsed: Option<std::time::Duration>) {
    ui.horizontal(|ui| {
        ui.spinner();
        let secs = elapsed.map(|d| d.as_secs()).unwrap_or(0);
        ui.label(
            egui::RichText::new(format!("{} ({}s)", message, secs))
                .color(egui::Color32::from_gray(200)),
        );
    });
}

/// Inline error with a dismiss button. Returns true when dismissed.
pub fn dismissible_error(ui: &mut egui::Ui, message: &str) -> bool {
    let mut dismissed = false;
    egui::Frame::none()
        .fill(egui::Color32::from_rgb(70, 25, 25))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(message).color(egui::Color32::from_rgb(255, 150, 150)));
                if ui.small_button("✕").on_hover_text("Dismiss").clicked() {
                    dismissed = true;
                }
            });
        });
    dismissed
}
