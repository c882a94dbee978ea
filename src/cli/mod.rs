//! Command-line interface.
//!
//! - `api` - serve the catalog REST API
//! - `web` - serve the web front-end against a running API
//! - `all` - both servers in one process
//! - `check` - validate the configuration and exit

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(author, version, about = "Product catalog API and web front-end", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "CATALOG_CONFIG", default_value = "catalog.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Serve the catalog REST API
    Api,
    /// Serve the web front-end
    Web,
    /// Serve the API and the web front-end together
    All,
    /// Validate the configuration file and exit
    Check,
}
