//! Google People and Calendar backends.
//!
//! - [`GoogleCredentialProvider`] obtains an access token: it loads the
//!   persisted token, refreshes it when expired, and falls back to the
//!   OAuth 2.0 PKCE flow with a loopback redirect
//! - [`PeopleClient`] lists the user's connections with names and birthdays
//! - [`GoogleCalendarClient`] inserts birthday events with explicit ids
//!
//! The user supplies their own OAuth client (Google requires it for desktop
//! applications), either inline or as a downloaded `client_secret.json`.

mod calendar;
mod config;
mod credentials;
mod oauth;
mod people;
mod tokens;

pub use calendar::{CALENDAR_API_BASE, EventResource, GoogleCalendarClient};
pub use config::{GoogleConfig, OAuthCredentials};
pub use credentials::GoogleCredentialProvider;
pub use oauth::{AuthorizationCode, OAuthClient, PkceFlow};
pub use people::{PEOPLE_API_BASE, PeopleClient};
pub use tokens::{TokenInfo, TokenStorage};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderResult};

/// Builds the HTTP client shared by every Google request.
pub fn build_http_client(config: &GoogleConfig) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))
}

/// Classifies a transport failure.
pub(crate) fn request_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("request failed: {}", e)
    };
    ProviderError::network(message).with_source(e)
}

/// Turns a non-success response into an error, consuming the body.
pub(crate) async fn status_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        ));
    }

    if status == StatusCode::UNAUTHORIZED {
        return ProviderError::authentication("access token expired or invalid");
    }

    let body = response.text().await.unwrap_or_default();
    ProviderError::from_http_status(status.as_u16(), &body)
}

/// Reads a successful response body as JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ProviderResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;
    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
    })
}
