// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! AI analysis stage.
//!
//! Optional player details, a preview of the exact prompt, and the submit
//! button. The details are edited in place; everything else comes back as an
//! action.

use crate::models::analysis::PlayerMetadata;
use crate::models::player::DetectedPlayer;
use crate::prompt::FOCUS_TEMPLATES;
use std::time::Duration;

/// Result of analysis stage interaction.
pub enum AnalysisAction {
    None,
    Submit,
    DismissError,
}

/// Read-only state the analysis stage draws from.
pub struct AnalysisView<'a> {
    pub player: Option<&'a DetectedPlayer>,
    pub timestamp: f64,
    pub prompt: Option<&'a str>,
    pub busy: Option<Duration>,
    pub backend_available: bool,
    pub error: Option<&'a str>,
}

/// Display the analysis stage.
pub fn show(ui: &mut egui::Ui, view: &AnalysisView, metadata: &mut PlayerMetadata) -> AnalysisAction {
    let mut action = AnalysisAction::None;

    ui.heading("Player details");
    match view.player {
        Some(player) => ui.label(format!(
            "Player #{} at ({:.0}, {:.0}), {}",
            player.id,
            player.center.x,
            player.center.y,
            super::timeline::format_timestamp(view.timestamp)
        )),
        None => ui.label(egui::RichText::new("No player selected").weak()),
    };
    ui.add_space(8.0);

    let editable = view.busy.is_none();
    egui::Grid::new("player_metadata")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("Name");
            ui.add_enabled(
                editable,
                egui::TextEdit::singleline(&mut metadata.name).hint_text("optional"),
            );
            ui.end_row();

            ui.label("Jersey number");
            ui.add_enabled(
                editable,
                egui::TextEdit::singleline(&mut metadata.jersey_number).hint_text("optional"),
            );
            ui.end_row();

            ui.label("Position");
            ui.add_enabled(
                editable,
                egui::TextEdit::singleline(&mut metadata.position).hint_text("e.g. Left Winger"),
            );
            ui.end_row();
        });

    ui.add_space(8.0);
    ui.label("Analysis focus");
    ui.add_enabled(
        editable,
        egui::TextEdit::multiline(&mut metadata.focus)
            .hint_text("optional, e.g. a question about this moment")
            .desired_rows(2)
            .desired_width(f32::INFINITY),
    );
    ui.horizontal_wrapped(|ui| {
        ui.label(egui::RichText::new("Templates:").small().weak());
        for template in FOCUS_TEMPLATES {
            if ui.add_enabled(editable, egui::Button::new(template).small()).clicked() {
                metadata.focus = template.to_string();
            }
        }
    });

    ui.add_space(8.0);
    if let Some(prompt) = view.prompt {
        egui::CollapsingHeader::new("Prompt preview")
            .default_open(false)
            .show(ui, |ui| {
                egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    ui.label(egui::RichText::new(prompt).monospace().small());
                });
            });
    }

    ui.add_space(12.0);
    if let Some(elapsed) = view.busy {
        super::busy_indicator(ui, "Generating report", Some(elapsed));
    } else {
        let button = ui
            .add_enabled(
                view.player.is_some() && view.backend_available,
                egui::Button::new("Generate report").min_size(egui::vec2(180.0, 32.0)),
            )
            .on_disabled_hover_text("Needs a selected player and a reachable server");
        if button.clicked() {
            action = AnalysisAction::Submit;
        }
    }

    if let Some(message) = view.error {
        ui.add_space(8.0);
        if super::dismissible_error(ui, message) {
            action = AnalysisAction::DismissError;
        }
    }

    action
}
