//! Richpad - minimal rich-text word processor
//!
//! Edits plain text, HTML and RTF documents, with periodic crash-recovery
//! snapshots and user-defined document properties.

mod app;
mod core;
mod ui;

use app::RichpadApp;
use crate::core::config::AppConfig;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    tracing::info!("Starting Richpad...");

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {:#}", e);
        AppConfig::default()
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([480.0, 320.0])
            .with_title("Richpad"),
        ..Default::default()
    };

    eframe::run_native(
        "Richpad",
        native_options,
        Box::new(|cc| Ok(Box::new(RichpadApp::new(cc, config)))),
    )
}
