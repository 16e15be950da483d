//! tilda-gtk: GTK4 UI for tilda
//!
//! This crate implements the drop-down window using GTK4 and VTE.

mod app;
mod hotkey;
mod terminal;
mod window;

use std::path::PathBuf;

use clap::Parser;
use gtk4::prelude::*;
use gtk4::{gio, glib, Application};

pub use glib::ExitCode;

/// Command-line arguments for tilda
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tilda", version, about = "A drop-down terminal")]
pub struct Args {
    /// Run a command in the first tab instead of the shell
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,

    /// Set the working directory
    #[arg(short = 'w', long = "working-dir")]
    pub working_dir: Option<PathBuf>,

    /// Start hidden, waiting for the pull key
    #[arg(long)]
    pub hidden: bool,

    /// Horizontal window position
    #[arg(short = 'x', long = "x-pos")]
    pub x_pos: Option<i64>,

    /// Vertical window position
    #[arg(short = 'y', long = "y-pos")]
    pub y_pos: Option<i64>,
}

/// Run the GTK4 application
pub fn run() -> ExitCode {
    // Parse command-line arguments first (before GTK consumes them)
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting tilda");

    // Every instance runs its own process
    let app = Application::builder()
        .application_id("org.tilda.Tilda")
        .flags(gio::ApplicationFlags::NON_UNIQUE)
        .build();

    app.connect_activate(move |app| {
        app::build_ui(app, &args);
    });

    // Options were already handled by clap
    let argv0: Vec<String> = std::env::args().take(1).collect();
    let exit_code = app.run_with_args(&argv0);

    if app::startup_failed() {
        return ExitCode::FAILURE;
    }
    exit_code
}
