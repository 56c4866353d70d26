//! Google provider configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// OAuth 2.0 client credentials for Google API access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Structure of Google's OAuth client secret JSON file.
///
/// Accepts the Cloud Console layout (`installed` or `web` section) and the
/// flat layout with `client_id`/`client_secret` at the root.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretSection>,
    web: Option<ClientSecretSection>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretSection {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a client secret JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            format!(
                "failed to read client secret file {}: {}",
                path.display(),
                e
            )
        })?;
        Self::from_json(&content)
    }

    /// Parses credentials from client secret JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: ClientSecretFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse client secret JSON: {}", e))?;

        if let Some(section) = file.installed.or(file.web) {
            return Ok(Self::new(section.client_id, section.client_secret));
        }

        match (file.client_id, file.client_secret) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            _ => Err(
                "client secret file must contain an 'installed'/'web' section or 'client_id'/'client_secret' at root level"
                    .to_string(),
            ),
        }
    }

    /// Checks that the credentials look like a Google OAuth client.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Configuration shared by the Google credential provider and API clients.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,

    /// Where the authorized token is persisted.
    ///
    /// Defaults to `~/.local/share/bdaysync/token.json`.
    pub token_path: PathBuf,

    /// OAuth scopes to request.
    ///
    /// Defaults to read-only contacts plus calendar write access.
    pub scopes: Vec<String>,

    /// Request timeout for every HTTP call.
    pub timeout: Duration,

    pub user_agent: String,

    /// Ports tried, in order, for the OAuth loopback redirect.
    pub loopback_port_range: (u16, u16),
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const CONTACTS_SCOPE: &'static str = "https://www.googleapis.com/auth/contacts.readonly";
    pub const CALENDAR_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar";

    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            token_path: Self::default_token_path(),
            scopes: vec![
                Self::CONTACTS_SCOPE.to_string(),
                Self::CALENDAR_SCOPE.to_string(),
            ],
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("bdaysync/{}", env!("CARGO_PKG_VERSION")),
            loopback_port_range: (8080, 8090),
        }
    }

    pub fn default_token_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bdaysync")
            .join("token.json")
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err("invalid loopback port range".to_string());
        }

        if self.timeout.is_zero() {
            return Err("timeout must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> OAuthCredentials {
        OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret")
    }

    #[test]
    fn credentials_validation() {
        assert!(credentials().validate().is_ok());
        assert!(OAuthCredentials::new("", "s").validate().is_err());
        assert!(OAuthCredentials::new("bad-id", "s").validate().is_err());
        assert!(
            OAuthCredentials::new("x.apps.googleusercontent.com", "")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn default_scopes_cover_contacts_and_calendar() {
        let config = GoogleConfig::new(credentials());
        assert_eq!(
            config.scopes,
            vec![
                GoogleConfig::CONTACTS_SCOPE.to_string(),
                GoogleConfig::CALENDAR_SCOPE.to_string()
            ]
        );
        assert!(config.token_path.ends_with("bdaysync/token.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_validation() {
        let config = GoogleConfig::new(credentials()).with_scopes(vec![]);
        assert!(config.validate().is_err());

        let config = GoogleConfig::new(credentials()).with_loopback_port_range(9000, 8000);
        assert!(config.validate().is_err());

        let config = GoogleConfig::new(credentials()).with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn client_secret_installed_section() {
        let json = r#"{
            "installed": {
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "secret",
                "project_id": "birthdays",
                "redirect_uris": ["http://localhost"]
            }
        }"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds, OAuthCredentials::new("id.apps.googleusercontent.com", "secret"));
    }

    #[test]
    fn client_secret_web_section() {
        let json = r#"{"web": {"client_id": "w.apps.googleusercontent.com", "client_secret": "ws"}}"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_secret, "ws");
    }

    #[test]
    fn client_secret_flat_layout() {
        let json = r#"{"client_id": "f.apps.googleusercontent.com", "client_secret": "fs"}"#;
        let creds = OAuthCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "f.apps.googleusercontent.com");
    }

    #[test]
    fn client_secret_missing_fields() {
        let err = OAuthCredentials::from_json(r#"{"other": {}}"#).unwrap_err();
        assert!(err.contains("client_id"));

        let err = OAuthCredentials::from_json("not json").unwrap_err();
        assert!(err.contains("parse"));
    }

    #[test]
    fn client_secret_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_secret.json");
        std::fs::write(
            &path,
            r#"{"installed": {"client_id": "file.apps.googleusercontent.com", "client_secret": "x"}}"#,
        )
        .unwrap();

        let creds = OAuthCredentials::from_file(&path).unwrap();
        assert_eq!(creds.client_id, "file.apps.googleusercontent.com");

        let err = OAuthCredentials::from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(err.contains("failed to read"));
    }
}
