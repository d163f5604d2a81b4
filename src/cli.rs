use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediastrip")]
#[command(author, version, about = "Filmstrip preview generation and caching")]
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
    /// Regenerate previews for every media file under a directory
    Generate {
        /// Directory to scan
        #[arg(required = true)]
        dir: PathBuf,
    },

    /// Generate (or fetch from cache) the preview for a single file
    Preview {
        /// Media file to preview
        #[arg(required = true)]
        file: PathBuf,

        /// Print only the data URL, no summary line
        #[arg(long)]
        raw: bool,
    },

    /// Check that required external tools are available
    CheckTools,
}
