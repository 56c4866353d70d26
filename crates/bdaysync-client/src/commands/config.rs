//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Prints the effective configuration as TOML.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let text = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# {}", path.display());
    println!("{}", text);
    Ok(())
}

/// Checks settings and, when configured, that the OAuth client resolves.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate()?;

    #[cfg(feature = "google")]
    {
        config.google.to_google_config()?;
        println!("Google credentials are valid.");
    }

    println!("Configuration is valid.");
    Ok(())
}

pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}
