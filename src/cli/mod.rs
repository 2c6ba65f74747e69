//! CLI module for Inkboard
//!
//! Provides commands:
//! - `serve`: Start the HTTP and WebSocket server
//! - `config`: Print or save the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod config;

/// Inkboard collaborative drawing board
#[derive(Parser, Debug)]
#[command(name = "inkboard")]
#[command(about = "Collaborative drawing board server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show the effective configuration
    Config {
        /// Write it to this file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve { port }) => {
            let mut config = inkboard::server::load_config()?;
            if let Some(port) = port {
                config.server.port = port;
            }
            inkboard::server::run(config).await
        }
        Some(Commands::Config { output }) => config::run(output.as_deref()),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
