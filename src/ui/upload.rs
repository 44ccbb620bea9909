// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video upload stage.
//!
//! A drop zone that also opens a native file picker. Validation happens in
//! the background (see `crate::io::validation`); this stage only reports
//! which file the user chose.

use crate::config::UploadConfig;
use crate::models::video::format_file_size;
use std::path::PathBuf;

/// Result of upload stage interaction.
pub enum UploadAction {
    None,
    Choose(PathBuf),
    DismissError,
}

/// Display the upload stage.
pub fn show(
    ui: &mut egui::Ui,
    config: &UploadConfig,
    validating: Option<&str>,
    error: Option<&str>,
) -> UploadAction {
    let mut action = UploadAction::None;
    let ctx = ui.ctx().clone();

    let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
    let dropped = ctx.input(|i| i.raw.dropped_files.clone());
    if validating.is_none() {
        if let Some(path) = dropped.into_iter().find_map(|f| f.path) {
            log::info!("File dropped: {}", path.display());
            action = UploadAction::Choose(path);
        }
    }

    let extensions: Vec<&str> = config.allowed_extensions.iter().map(|s| s.as_str()).collect();

    ui.vertical_centered(|ui| {
        ui.add_space(40.0);
        ui.heading(
            egui::RichText::new("Upload a match video")
                .size(24.0)
                .color(egui::Color32::from_gray(210)),
        );
        ui.add_space(20.0);

        let stroke_color = if hovering {
            egui::Color32::from_rgb(90, 170, 255)
        } else {
            egui::Color32::from_gray(90)
        };

        egui::Frame::none()
            .stroke(egui::Stroke::new(2.0, stroke_color))
            .fill(egui::Color32::from_gray(35))
            .rounding(8.0)
            .inner_margin(egui::Margin::symmetric(60.0, 40.0))
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    if let Some(name) = validating {
                        ui.spinner();
                        ui.add_space(8.0);
                        ui.label(format!("Checking {}...", name));
                        return;
                    }

                    ui.label(
                        egui::RichText::new("Drop a video file here")
                            .size(16.0)
                            .color(egui::Color32::from_gray(200)),
                    );
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new("or").weak());
                    ui.add_space(8.0);
                    if ui.button("Choose file...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Videos", &extensions[..])
                            .pick_file()
                        {
                            action = UploadAction::Choose(path);
                        }
                    }
                    ui.add_space(12.0);
                    let mut formats = extensions.join(", ").to_uppercase();
                    if let Some(limit) = config.max_upload_bytes {
                        formats.push_str(&format!(" · up to {}", format_file_size(limit)));
                    }
                    ui.label(egui::RichText::new(formats).small().weak());
                });
            });

        if let Some(message) = error {
            ui.add_space(12.0);
            if super::dismissible_error(ui, message) {
                action = UploadAction::DismissError;
            }
        }
    });

    action
}
