use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod input;
mod logbook;
mod providers;
mod session;
mod utils;

use crate::app::Application;
use crate::cli::Args;
use crate::config::{Preferences, Settings};
use crate::core::error::LchatError;

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), LchatError> {
    let args = Args::parse();

    let prefs = Preferences::load_with_overrides(args.config.as_deref(), &args.overrides)?;
    init_tracing(prefs.as_ref().map(config::logging_level).unwrap_or("info"));

    if args.config.is_none() {
        let path = Preferences::config_path();
        match Preferences::seed_default_file(&path) {
            Ok(true) => info!("Wrote default preferences to {}", path.display()),
            Ok(false) => {}
            Err(e) => warn!("Could not write default preferences: {}", e),
        }
    }

    let settings = prefs.and_then(|prefs| Settings::from_preferences(&prefs));
    if let Ok(settings) = &settings {
        debug!("Chat endpoint: {}", settings.chat_endpoint());
    }
    match &settings {
        Ok(settings) if !args.no_cleanup => {
            match logbook::cleanup_logs(&settings.log_directory, settings.log_cleanup_days) {
                Ok(report) if !report.removed.is_empty() => {
                    info!("Removed {} old log file(s)", report.removed.len());
                }
                Ok(_) => {}
                Err(e) => warn!("Log cleanup failed: {}", e),
            }
        }
        Ok(_) => {}
        Err(e) => warn!("Invalid preferences: {}", e),
    }

    let mut app = Application::new(args, settings);
    app.run().await
}
