//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod list;
pub mod sync;

use crate::config::ClientConfig;
use crate::engine::SyncEngine;
use crate::error::ClientResult;

/// Builds the Google credential provider from `[google]`.
#[cfg(feature = "google")]
pub fn build_credentials(
    config: &ClientConfig,
) -> ClientResult<bdaysync_providers::google::GoogleCredentialProvider> {
    use bdaysync_providers::google::{GoogleCredentialProvider, build_http_client};

    config.validate()?;
    let google = config.google.to_google_config()?;
    let http = build_http_client(&google)?;
    Ok(GoogleCredentialProvider::new(google, http)?)
}

/// Wires the Google credential provider and API clients into an engine.
#[cfg(feature = "google")]
pub fn build_engine(config: &ClientConfig) -> ClientResult<SyncEngine> {
    use std::sync::Arc;

    use bdaysync_providers::google::{
        GoogleCalendarClient, GoogleCredentialProvider, PeopleClient, build_http_client,
    };

    config.validate()?;
    let google = config.google.to_google_config()?;
    let http = build_http_client(&google)?;

    let credentials = GoogleCredentialProvider::new(google, http.clone())?;
    Ok(SyncEngine::new(
        Arc::new(credentials),
        Arc::new(PeopleClient::new(http.clone())),
        Arc::new(GoogleCalendarClient::new(http)),
        config.sync_options(),
    ))
}

#[cfg(not(feature = "google"))]
pub fn build_engine(_config: &ClientConfig) -> ClientResult<SyncEngine> {
    Err(without_google())
}

#[cfg(not(feature = "google"))]
fn without_google() -> crate::error::ClientError {
    crate::error::ClientError::Config("bdaysync was built without Google support".to_string())
}
