// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Report stage.

use super::canvas;
use crate::models::analysis::AnalysisResult;
use crate::util::geometry::{self, Size};
use std::path::PathBuf;

/// Result of report stage interaction.
pub enum ResultAction {
    None,
    CopyReport,
    SaveReport(PathBuf),
    StartOver,
}

/// Display the finished report next to the frame it was made from.
pub fn show(
    ui: &mut egui::Ui,
    result: &AnalysisResult,
    texture: Option<&egui::TextureHandle>,
    show_prompt: &mut bool,
) -> ResultAction {
    let mut action = ResultAction::None;

    ui.horizontal(|ui| {
        if ui.button("📋 Copy report").clicked() {
            action = ResultAction::CopyReport;
        }
        if ui.button("💾 Save report...").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("YAML", &["yaml", "yml"])
                .add_filter("JSON", &["json"])
                .set_file_name(format!("player_{}_report.yaml", result.selected_player_id))
                .save_file()
            {
                action = ResultAction::SaveReport(path);
            }
        }
        ui.toggle_value(show_prompt, "Show prompt");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Start over").clicked() {
                action = ResultAction::StartOver;
            }
        });
    });
    ui.separator();

    let frame_height = (ui.available_height() * 0.45).max(120.0);
    ui.allocate_ui(egui::vec2(ui.available_width(), frame_height), |ui| {
        if let Some(texture) = texture {
            if let Some(image_rect) = canvas::paint_frame(ui, texture, result.image_dimensions) {
                let rendered = Size::new(image_rect.width() as f64, image_rect.height() as f64);
                let selected = result
                    .selected_player()
                    .and_then(|p| geometry::scale_box(&p.bbox, result.image_dimensions, rendered));
                if let Some(b) = selected {
                    let rect = canvas::screen_rect(&image_rect, &b);
                    canvas::draw_selected_box(ui.painter(), rect, result.selected_player_id);
                }
            }
        }
        ui.allocate_space(ui.available_size());
    });
    ui.separator();

    egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
        if *show_prompt {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.label(egui::RichText::new("Prompt").strong());
                ui.label(egui::RichText::new(&result.prompt_text).monospace().small());
            });
            ui.add_space(8.0);
        }

        for paragraph in result.paragraphs() {
            if paragraph.trim().is_empty() {
                ui.add_space(6.0);
            } else {
                ui.label(paragraph);
            }
        }
    });

    action
}
