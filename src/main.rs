mod audio;
mod card;
mod config;
mod error;
mod logger;
mod search;
mod tmdb;
mod ui;

use clap::Parser;
use gtk::prelude::*;
use gtk::{glib, Application};

use config::{AppConfig, CliConfig};

fn main() -> glib::ExitCode {
    let cli = CliConfig::parse();
    logger::init_logger(cli.verbose);
    tracing::info!("Starting movie-search");

    let config = match AppConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return glib::ExitCode::FAILURE;
        }
    };
    if config.has_api_key() {
        tracing::debug!("TMDB API key configured");
    }

    let app = Application::builder()
        .application_id("com.example.moviesearch")
        .build();

    app.connect_activate(move |app| ui::build_ui(app, config.clone()));

    // Arguments were already consumed by clap.
    app.run_with_args::<&str>(&[])
}
