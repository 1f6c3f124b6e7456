use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eframe::egui::{self, Visuals};
use tracing_subscriber::EnvFilter;

mod bridge;
mod editor;
mod student;
mod studio;
mod ui;
mod view_model;

use student::StudentApp;
// the module shadows the `studio` crate, so name it explicitly
use crate::studio::StudioApp;

#[derive(Parser)]
struct Args {
    /// Path to a configuration file (defaults to the platform config
    /// directory)
    #[clap(short, long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open a student workspace from a snapshot file
    Student { snapshot: PathBuf },
    /// Edit the instructor settings for an exercise
    Studio { settings: PathBuf },
}

fn main() -> eyre::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
    let _ = color_eyre::install();

    let args = Args::parse();
    let config = config::load(args.config.as_deref());
    tracing::debug!(?config, "loaded configuration");

    let title = match args.command {
        Command::Student { .. } => "Codebench",
        Command::Studio { .. } => "Codebench Studio",
    };

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        title,
        native_options,
        Box::new(move |cc| {
            let style = egui::Style {
                visuals: match config.theme {
                    config::Theme::Light => Visuals::light(),
                    config::Theme::Dark => Visuals::dark(),
                    config::Theme::Auto => match dark_light::detect() {
                        dark_light::Mode::Dark | dark_light::Mode::Default => Visuals::dark(),
                        dark_light::Mode::Light => Visuals::light(),
                    },
                },
                ..Default::default()
            };
            cc.egui_ctx.set_style(style);

            let app: Box<dyn eframe::App> = match args.command {
                Command::Student { snapshot } => Box::new(
                    StudentApp::new(&snapshot, &config, cc).map_err(|e| {
                        Box::<dyn std::error::Error + Send + Sync>::from(e.to_string())
                    })?,
                ),
                Command::Studio { settings } => Box::new(StudioApp::new(&settings).map_err(
                    |e| Box::<dyn std::error::Error + Send + Sync>::from(e.to_string()),
                )?),
            };
            Ok(app)
        }),
    )
    .map_err(|e| eyre::eyre!("running gui mainloop: {e}"))
}
