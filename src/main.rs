//! Uber Pickups - Interactive dashboard of Uber pickups in New York City
//!
//! Downloads the public September 2014 pickup dataset, caches it in memory and
//! shows a histogram of pickups by hour plus a map filtered by an hour slider.

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use anyhow::Context;
use config::{AppConfig, CONFIG_FILE};
use data::{HttpSource, PickupLoader};
use eframe::egui;
use gui::PickupsApp;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = AppConfig::load_or_default(Path::new(CONFIG_FILE))
        .with_context(|| format!("loading {}", CONFIG_FILE))?;
    info!(url = %config.data_url, row_limit = config.row_limit, "starting dashboard");

    let loader = PickupLoader::from_config(HttpSource::new(&config.data_url)?, &config);

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Uber Pickups in NYC"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Uber Pickups in NYC",
        options,
        Box::new(move |cc| Ok(Box::new(PickupsApp::new(cc, config, loader)))),
    )
    .map_err(|e| anyhow::anyhow!("dashboard failed: {}", e))
}
