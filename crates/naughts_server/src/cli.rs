//! Command-line interface for naughts_server.

use clap::{Parser, Subcommand};

/// Naughts Server - real-time matchmaking for two-player naughts and crosses
#[derive(Parser, Debug)]
#[command(name = "naughts_server")]
#[command(about = "Matchmaking and session server for naughts and crosses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket game server
    Serve {
        /// Path to the TOML config file (defaults apply if it doesn't exist)
        #[arg(short, long, default_value = "naughts.toml")]
        config: std::path::PathBuf,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Public base URL used in invite links (overrides config)
        #[arg(long)]
        public_url: Option<String>,
    },
}
