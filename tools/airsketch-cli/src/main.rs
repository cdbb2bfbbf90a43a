//! AirSketch CLI: drive drawing sessions from landmark recordings.
//!
//! Usage:
//!   airsketch replay <RECORDING>   Run a drawing session over a recording
//!   airsketch synth <OUTPUT>       Write a scripted synthetic recording
//!   airsketch render <SKETCH>      Rasterize a saved sketch
//!   airsketch info <SKETCH>        Show sketch statistics
//!   airsketch config               Print or write the session config

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use airsketch_model::synthetic::Scenario;

mod commands;

#[derive(Parser)]
#[command(
    name = "airsketch",
    about = "Draw in the air with hand gestures",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a drawing session over a landmark recording
    Replay {
        /// Recording file (JSONL)
        recording: PathBuf,

        #[command(flatten)]
        options: commands::replay::ReplayOptions,
    },

    /// Write a synthetic landmark recording
    Synth {
        /// Output recording path
        output: PathBuf,

        /// Script to generate: draw|erase|undo|showcase
        #[arg(short, long, default_value = "showcase")]
        scenario: Scenario,

        /// Frames per second of the generated recording
        #[arg(long, default_value = "30")]
        fps: u32,
    },

    /// Rasterize a saved sketch to an image
    Render {
        /// Sketch document (JSON)
        sketch: PathBuf,

        /// Output image (png, jpg, or bmp)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show sketch statistics
    Info {
        /// Sketch document (JSON)
        sketch: PathBuf,
    },

    /// Print the effective session config
    Config {
        /// Write the defaults to this file instead of printing them
        #[arg(long, value_name = "PATH")]
        init: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    airsketch_common::logging::init_logging(&airsketch_common::logging::cli_logging_config(
        cli.verbose,
        cli.log_json,
    ));

    match cli.command {
        Commands::Replay { recording, options } => commands::replay::run(recording, options).await,
        Commands::Synth {
            output,
            scenario,
            fps,
        } => commands::synth::run(output, scenario, fps),
        Commands::Render { sketch, output } => commands::render::run(sketch, output),
        Commands::Info { sketch } => commands::info::run(sketch),
        Commands::Config { init } => commands::config::run(init),
    }
}
