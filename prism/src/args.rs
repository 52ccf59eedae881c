use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "prism", about = "Multi-provider LLM gateway", version)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "PRISM_CONFIG", default_value = "prism.toml")]
    pub config: PathBuf,
}
