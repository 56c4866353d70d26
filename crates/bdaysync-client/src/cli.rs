//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// bdaysync - Google Contacts birthdays as recurring calendar events
#[derive(Debug, Parser)]
#[command(name = "bdaysync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "BDAYSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a birthday event for every contact with a birthday
    Sync,

    /// Print contact birthdays without touching the calendar
    List,

    /// Google authorization commands
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum AuthAction {
    /// Authorize access to contacts and calendar
    Login {
        /// Re-authorize even if a usable token is stored
        #[arg(long, short)]
        force: bool,
    },

    /// Show whether a usable token is stored
    Status,

    /// Remove the stored token
    Logout,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
