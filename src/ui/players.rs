// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Detected players panel.

use crate::models::player::DetectedPlayer;

/// Result of players panel interaction.
pub enum PlayersAction {
    None,
    TogglePlayer(u32),
    Continue,
}

/// Display the list of detected players and the continue button.
pub fn show(ui: &mut egui::Ui, players: &[DetectedPlayer], selected: Option<u32>) -> PlayersAction {
    let mut action = PlayersAction::None;

    ui.heading("Players");
    ui.separator();

    if players.is_empty() {
        ui.label(egui::RichText::new("No players detected").italics().weak());
        ui.label(egui::RichText::new("Go back and try a different frame.").small().weak());
    } else {
        ui.label(format!("{} detected · click one to select", players.len()));
        ui.add_space(4.0);

        egui::ScrollArea::vertical()
            .max_height(ui.available_height() - 60.0)
            .show(ui, |ui| {
                for player in players {
                    let is_selected = Some(player.id) == selected;
                    let text = format!(
                        "#{}  ({:.0}, {:.0})",
                        player.id, player.center.x, player.center.y
                    );
                    if ui.selectable_label(is_selected, text).clicked() {
                        action = PlayersAction::TogglePlayer(player.id);
                    }
                }
            });
    }

    ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
        ui.add_space(8.0);
        let button = ui
            .add_enabled(
                selected.is_some(),
                egui::Button::new("Continue").min_size(egui::vec2(160.0, 28.0)),
            )
            .on_disabled_hover_text("Select a player first");
        if button.clicked() {
            action = PlayersAction::Continue;
        }
        if let Some(id) = selected {
            ui.label(egui::RichText::new(format!("Selected: #{}", id)).strong());
        }
    });

    action
}
