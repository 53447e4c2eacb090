use anyhow::Context;
use cablemap::config::{SnapshotConfig, ViewConfig};
use cablemap::settings::Settings;
use cablemap::store::{FileStore, ModeStore};
use cablemap::{app, logging, ViewMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cablemap")]
#[command(author = "Terminal Art Generator")]
#[command(version = "0.1.0")]
#[command(about = "cablemap: submarine cables and the Nigeria boundary in your terminal", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive map
    View {
        /// Start in this mode and remember it (grand, focus)
        #[arg(short, long)]
        mode: Option<ViewMode>,

        /// Boundary GeoJSON: URL or file under the asset dir
        #[arg(short, long)]
        boundary: Option<String>,

        /// Where the selected view mode is remembered
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Frame time in seconds
        #[arg(short, long, default_value = "0.03")]
        time: f32,

        /// Skip the submarine cable overlay
        #[arg(long)]
        no_cables: bool,
    },

    /// Show the remembered view mode, or set it
    Mode {
        mode: Option<ViewMode>,

        #[arg(short, long)]
        state: Option<PathBuf>,
    },

    /// Print one settled frame to stdout (no interactive display)
    Snapshot {
        #[arg(short, long, default_value = "grand")]
        mode: ViewMode,

        #[arg(short = 'W', long, default_value = "100")]
        width: u16,

        #[arg(short = 'H', long, default_value = "32")]
        height: u16,

        #[arg(short, long)]
        boundary: Option<String>,

        #[arg(long)]
        no_cables: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    let log_file = matches!(cli.command, Commands::View { .. }).then(|| settings.log_path());
    logging::init(cli.verbose, log_file.as_deref());
    if let Some(e) = settings_error {
        tracing::warn!("{}, using defaults", e);
    }

    match cli.command {
        Commands::View {
            mode,
            boundary,
            state,
            time,
            no_cables,
        } => {
            let mut map = settings.map_config();
            if let Some(source) = boundary {
                map.boundary_source = source;
            }
            let config = ViewConfig {
                map,
                place_key: settings.keys.place_key(),
                time_step: time,
                mode_override: mode,
                state_path: state.unwrap_or_else(|| settings.state_path()),
                cables: settings.show_cables() && !no_cables,
            };
            app::run(config).context("map viewer failed")?;
        }
        Commands::Mode { mode, state } => {
            let mut store = FileStore::new(state.unwrap_or_else(|| settings.state_path()));
            if let Some(mode) = mode {
                store.save(mode)?;
            }
            println!("{}", store.load());
        }
        Commands::Snapshot {
            mode,
            width,
            height,
            boundary,
            no_cables,
        } => {
            let mut map = settings.map_config();
            if let Some(source) = boundary {
                map.boundary_source = source;
            }
            let config = SnapshotConfig {
                map,
                mode,
                width,
                height,
                cables: settings.show_cables() && !no_cables,
            };
            app::snapshot(config).context("snapshot failed")?;
        }
    }

    Ok(())
}
