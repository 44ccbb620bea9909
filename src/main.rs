// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! PitchScout - soccer video player analysis
//!
//! A desktop client that walks the user from a match video to an AI-written
//! report on one player: upload, pick a frame, click a detected player,
//! then generate the report through the analysis server.

mod api;
mod app;
mod config;
mod io;
mod jobs;
mod models;
mod prompt;
mod ui;
mod util;
mod wizard;

use anyhow::{Context, Result};
use api::ApiClient;
use app::ScoutApp;
use config::AppConfig;

fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!("Analysis server: {}", config.backend.base_url);
    let client = ApiClient::new(&config.backend).context("failed to create HTTP client")?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true)
            .with_title("PitchScout - Soccer Player Analysis"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "PitchScout",
        options,
        Box::new(move |_cc| Ok(Box::new(ScoutApp::new(config, client)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
