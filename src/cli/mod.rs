pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sitewatch")]
#[command(about = "Watch announcement pages and notify subscribers", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the monitor and the chat bot until interrupted
    Run,
    /// Perform a single sweep over all sites and exit
    Sweep,
    /// Print the configured sites
    Sites,
}
