//! Authorization commands.

use std::io::{self, Write};
use std::path::Path;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Runs the consent flow unless a usable token is already stored.
#[cfg(feature = "google")]
pub async fn login(config: &ClientConfig, force: bool) -> ClientResult<()> {
    let provider = super::build_credentials(config)?;

    if provider.is_authorized() && !force {
        println!("Already authorized.");
        println!("Use --force to re-authorize.");
        return Ok(());
    }

    println!("A browser window will open for you to grant access to contacts and calendar.");
    println!("If it doesn't, open the URL printed in the log.");
    provider.reauthorize().await?;

    tracing::info!("authorization successful");
    println!("Authorization successful. Token saved to {}", provider.token_path().display());
    Ok(())
}

/// Reports whether a usable token is stored.
#[cfg(feature = "google")]
pub fn status(config: &ClientConfig) -> ClientResult<()> {
    let provider = super::build_credentials(config)?;
    write_status(
        &mut io::stdout().lock(),
        provider.is_authorized(),
        provider.token_path(),
    )?;
    Ok(())
}

/// Removes the stored token.
#[cfg(feature = "google")]
pub fn logout(config: &ClientConfig) -> ClientResult<()> {
    let provider = super::build_credentials(config)?;
    provider.logout()?;
    println!("Removed {}", provider.token_path().display());
    Ok(())
}

#[cfg(not(feature = "google"))]
pub async fn login(_config: &ClientConfig, _force: bool) -> ClientResult<()> {
    Err(super::without_google())
}

#[cfg(not(feature = "google"))]
pub fn status(_config: &ClientConfig) -> ClientResult<()> {
    Err(super::without_google())
}

#[cfg(not(feature = "google"))]
pub fn logout(_config: &ClientConfig) -> ClientResult<()> {
    Err(super::without_google())
}

pub fn write_status(out: &mut impl Write, authorized: bool, token_path: &Path) -> io::Result<()> {
    if authorized {
        writeln!(out, "authorized ({})", token_path.display())
    } else {
        writeln!(out, "not authorized; run `bdaysync auth login`")
    }
}
