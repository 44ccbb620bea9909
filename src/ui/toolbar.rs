// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Step indicator and server status bar.

use crate::wizard::{ServerStatus, Step};

/// Result of toolbar interaction.
pub enum ToolbarAction {
    None,
    Back,
    RetryHealth,
}

/// Display the step indicator with a back button.
pub fn show(ui: &mut egui::Ui, current: Step, can_go_back: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let back_label = if current == Step::Upload { "⏴ Quit" } else { "⏴ Back" };
        if ui.add_enabled(can_go_back, egui::Button::new(back_label)).clicked() {
            action = ToolbarAction::Back;
        }

        ui.separator();

        let current_index = Step::ALL.iter().position(|s| *s == current).unwrap_or(0);
        for (i, step) in Step::ALL.iter().enumerate() {
            let text = format!("{}. {}", i + 1, step.title());
            let text = match i.cmp(&current_index) {
                std::cmp::Ordering::Less => egui::RichText::new(format!("✔ {}", text))
                    .color(egui::Color32::from_rgb(90, 200, 120)),
                std::cmp::Ordering::Equal => egui::RichText::new(text).strong().color(egui::Color32::WHITE),
                std::cmp::Ordering::Greater => egui::RichText::new(text).weak(),
            };
            ui.label(text);
            if i + 1 < Step::ALL.len() {
                ui.label(egui::RichText::new("›").weak());
            }
        }
    });

    action
}

/// Display the server status line. Offline shows a retry button.
pub fn server_banner(ui: &mut egui::Ui, status: ServerStatus, base_url: &str) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| match status {
        ServerStatus::Checking => {
            ui.spinner();
            ui.label(egui::RichText::new(format!("Connecting to {}...", base_url)).weak());
        }
        ServerStatus::Online => {
            ui.label(egui::RichText::new("●").color(egui::Color32::from_rgb(90, 200, 120)));
            ui.label(egui::RichText::new(format!("Server online ({})", base_url)).weak());
        }
        ServerStatus::Offline => {
            ui.label(egui::RichText::new("●").color(egui::Color32::from_rgb(230, 80, 80)));
            ui.label(
                egui::RichText::new(format!(
                    "Cannot reach the analysis server at {}. Make sure it is running.",
                    base_url
                ))
                .color(egui::Color32::from_rgb(255, 150, 150)),
            );
            if ui.button("Retry").clicked() {
                action = ToolbarAction::RetryHealth;
            }
        }
    });

    action
}

/// Draw the step indicator and, right under it, the server status banner.
/// Returns the toolbar action, the banner action and the banner's rect.
pub fn show_panels(
    ctx: &egui::Context,
    current: Step,
    can_go_back: bool,
    status: ServerStatus,
    base_url: &str,
) -> (ToolbarAction, ToolbarAction, egui::Rect) {
    let steps = egui::TopBottomPanel::top("toolbar")
        .show(ctx, |ui| show(ui, current, can_go_back))
        .inner;
    let banner = egui::TopBottomPanel::top("server_status").show(ctx, |ui| server_banner(ui, status, base_url));
    (steps, banner.inner, banner.response.rect)
}
