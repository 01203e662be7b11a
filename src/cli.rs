use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scrollreel")]
#[command(author, version, about = "Scroll-synchronized video segment playback")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// List segments and the scroll offsets that select them
    Segments {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which segment a scroll offset selects
    Select {
        /// Offset into the pinned region, in pixels
        #[arg(long, allow_hyphen_values = true)]
        offset: f64,
    },

    /// Run a scripted scroll session against a simulated video
    Simulate {
        /// Script file (TOML, or JSON with a .json extension)
        #[arg(long, required = true)]
        script: PathBuf,

        /// Output events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}
