//! carviz - interactive car viewer
//!
//! Loads a single glTF car, stages it on a ground plane and lets the user
//! orbit it, fly between named camera presets, repaint the body, steer the
//! wheels and toggle a drive animation.
//!
//! ```bash
//! carviz --asset cars/final.glb
//! carviz --config viewer.json --dump-materials materials.json
//! carviz --pick --verbose
//! ```

mod app;
mod assets;
mod car;
mod config;
mod controller;
mod render;
mod scene;
mod ui;

use clap::Parser;
use config::ViewerConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "carviz")]
#[command(about = "Interactive car viewer")]
#[command(version)]
struct Args {
    /// Viewer configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Car asset to load (.gltf or .glb); overrides the configuration
    #[arg(short, long)]
    asset: Option<PathBuf>,

    /// Choose the car asset with a file dialog
    #[arg(long)]
    pick: bool,

    /// Write the bound material snapshot to this file once the car is loaded
    #[arg(long, value_name = "PATH")]
    dump_materials: Option<PathBuf>,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    let mut config = match &args.config {
        Some(path) => match ViewerConfig::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(err) => {
                log::error!("Failed to load configuration {}: {}", path.display(), err);
                std::process::exit(1);
            }
        },
        None => ViewerConfig::default(),
    };

    if let Some(asset) = args.asset {
        config.asset = asset;
    }
    if args.pick {
        match rfd::FileDialog::new()
            .add_filter("glTF", &["gltf", "glb"])
            .pick_file()
        {
            Some(path) => config.asset = path,
            None => log::warn!("No file picked; using {}", config.asset.display()),
        }
    }

    if let Some(path) = args.write_config {
        match config.save(&path) {
            Ok(()) => log::info!("Wrote configuration to {}", path.display()),
            Err(err) => {
                log::error!("Failed to write configuration {}: {}", path.display(), err);
                std::process::exit(1);
            }
        }
        return;
    }

    let options = app::RunOptions {
        config,
        material_report: args.dump_materials,
    };
    if let Err(err) = app::run(options) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
