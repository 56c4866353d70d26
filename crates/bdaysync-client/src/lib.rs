//! The `bdaysync` command: configuration, the sync engine and subcommands.

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::ClientConfig;
pub use engine::{BirthdayListing, SyncEngine, SyncError, SyncOptions};
pub use error::{ClientError, ClientResult, exit_code};
