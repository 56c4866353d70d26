//! Client configuration.
//!
//! All settings live in `~/.config/bdaysync/config.toml` by default. A
//! missing file means defaults. `client_id` and `client_secret` accept
//! secret references (`pass::...`, `env::...`), and paths may start with `~/`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{DEFAULT_CALENDAR_ID, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SyncOptions};
use crate::error::{ClientError, ClientResult};

const APP_DIR: &str = "bdaysync";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug logging.
    pub debug: bool,

    pub google: GoogleSettings,

    pub sync: SyncSettings,
}

/// The `[google]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Client secret JSON downloaded from the Google Cloud Console.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,

    /// Where the authorized token is kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,

    /// Calendar receiving the birthday events.
    pub calendar_id: String,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,

    /// First and last port tried for the OAuth redirect listener.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loopback_ports: Option<(u16, u16)>,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            credentials_file: None,
            token_path: None,
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            loopback_ports: None,
        }
    }
}

/// The `[sync]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Contacts requested per directory page.
    pub page_size: usize,

    /// Fetch all directory pages instead of only the first.
    pub follow_pages: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            follow_pages: false,
        }
    }
}

impl ClientConfig {
    /// Loads the default configuration file, or defaults if it is absent.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from `path`, which must exist.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// The client secret file used when none is configured.
    pub fn default_credentials_file() -> PathBuf {
        Self::default_config_dir().join("client_secret.json")
    }

    /// Checks values that would otherwise fail only mid-run.
    pub fn validate(&self) -> ClientResult<()> {
        if self.google.calendar_id.trim().is_empty() {
            return Err(ClientError::Config(
                "google.calendar_id must not be empty".to_string(),
            ));
        }
        if self.google.timeout_secs == 0 {
            return Err(ClientError::Config(
                "google.timeout_secs must be positive".to_string(),
            ));
        }
        if let Some((start, end)) = self.google.loopback_ports
            && (start == 0 || start > end)
        {
            return Err(ClientError::Config(format!(
                "google.loopback_ports [{}, {}] is not a valid port range",
                start, end
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.sync.page_size) {
            return Err(ClientError::Config(format!(
                "sync.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            calendar_id: self.google.calendar_id.clone(),
            page_size: self.sync.page_size,
            follow_pages: self.sync.follow_pages,
        }
    }
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Builds the provider configuration.
    pub fn to_google_config(&self) -> ClientResult<bdaysync_providers::google::GoogleConfig> {
        use bdaysync_providers::google::GoogleConfig;
        use std::time::Duration;

        let credentials = self.resolve_credentials()?;
        credentials
            .validate()
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;

        let mut config =
            GoogleConfig::new(credentials).with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(path) = &self.token_path {
            config = config.with_token_path(expand_home(path));
        }
        if let Some((start, end)) = self.loopback_ports {
            config = config.with_loopback_port_range(start, end);
        }
        Ok(config)
    }

    /// Resolves OAuth client credentials.
    ///
    /// Inline `client_id`/`client_secret` win, then `credentials_file`, then
    /// `client_secret.json` in the configuration directory.
    pub fn resolve_credentials(
        &self,
    ) -> ClientResult<bdaysync_providers::google::OAuthCredentials> {
        use bdaysync_providers::google::OAuthCredentials;

        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => {
                return Ok(OAuthCredentials::new(
                    crate::secret::resolve(id)?,
                    crate::secret::resolve(secret)?,
                ));
            }
            (Some(_), None) => {
                return Err(ClientError::Config(
                    "google.client_secret is missing".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ClientError::Config(
                    "google.client_id is missing".to_string(),
                ));
            }
            (None, None) => {}
        }

        let file = match &self.credentials_file {
            Some(path) => expand_home(path),
            None => {
                let default = ClientConfig::default_credentials_file();
                if !default.exists() {
                    return Err(ClientError::Config(format!(
                        "Google credentials not found. Add to {}:\n  \
                         [google]\n  \
                         client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                         client_secret = \"YOUR_SECRET\"\n\n  \
                         or save the client secret JSON as {}",
                        ClientConfig::default_path().display(),
                        default.display()
                    )));
                }
                default
            }
        };

        OAuthCredentials::from_file(&file).map_err(ClientError::Config)
    }
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.google.calendar_id, "primary");
        assert_eq!(config.sync.page_size, 200);
        assert!(!config.sync.follow_pages);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_file() {
        let config: ClientConfig = toml::from_str(
            r#"
debug = true

[google]
client_id = "id.apps.googleusercontent.com"
client_secret = "secret"
token_path = "/tmp/token.json"
calendar_id = "family"
timeout_secs = 10
loopback_ports = [9000, 9010]

[sync]
page_size = 500
follow_pages = true
"#,
        )
        .unwrap();

        assert!(config.debug);
        assert_eq!(config.google.timeout_secs, 10);
        assert_eq!(config.google.loopback_ports, Some((9000, 9010)));
        assert_eq!(
            config.sync_options(),
            SyncOptions {
                calendar_id: "family".to_string(),
                page_size: 500,
                follow_pages: true,
            }
        );
    }

    #[test]
    fn validation() {
        let mut config = ClientConfig::default();
        config.sync.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.google.loopback_ports = Some((9010, 9000));
        assert!(config.validate().is_err());
        config.google.loopback_ports = Some((0, 10));
        assert!(config.validate().is_err());
        config.google.loopback_ports = Some((9000, 9000));
        assert!(config.validate().is_ok());

        config.sync.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.google.calendar_id = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.google.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync]\nfollow_pages = true\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert!(config.sync.follow_pages);
        assert_eq!(config.sync.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn load_from_missing_or_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[sync]\npage_size = \"many\"\n").unwrap();
        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn dump_round_trips() {
        let config = ClientConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("client_id"));
        let back: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn default_paths() {
        assert!(ClientConfig::default_path().ends_with("bdaysync/config.toml"));
        assert!(ClientConfig::default_credentials_file().ends_with("bdaysync/client_secret.json"));
    }

    #[test]
    fn home_expansion() {
        let absolute = Path::new("/etc/bdaysync/token.json");
        assert_eq!(expand_home(absolute), absolute);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/.local/share/bdaysync/token.json")),
                home.join(".local/share/bdaysync/token.json")
            );
        }
    }

    #[cfg(feature = "google")]
    mod google {
        use super::*;

        fn settings(id: Option<&str>, secret: Option<&str>) -> GoogleSettings {
            GoogleSettings {
                client_id: id.map(String::from),
                client_secret: secret.map(String::from),
                ..Default::default()
            }
        }

        #[test]
        fn inline_credentials() {
            let creds = settings(Some("id.apps.googleusercontent.com"), Some("s"))
                .resolve_credentials()
                .unwrap();
            assert_eq!(creds.client_id, "id.apps.googleusercontent.com");
            assert_eq!(creds.client_secret, "s");
        }

        #[test]
        fn inline_credentials_from_env() {
            unsafe {
                std::env::set_var("_BDAYSYNC_CFG_ID", "env.apps.googleusercontent.com");
                std::env::set_var("_BDAYSYNC_CFG_SECRET", "env-secret");
            }
            let creds = settings(Some("env::_BDAYSYNC_CFG_ID"), Some("env::_BDAYSYNC_CFG_SECRET"))
                .resolve_credentials()
                .unwrap();
            assert_eq!(creds.client_id, "env.apps.googleusercontent.com");
            assert_eq!(creds.client_secret, "env-secret");
            unsafe {
                std::env::remove_var("_BDAYSYNC_CFG_ID");
                std::env::remove_var("_BDAYSYNC_CFG_SECRET");
            }
        }

        #[test]
        fn unresolvable_secret() {
            let err = settings(Some("id"), Some("env::_BDAYSYNC_CFG_UNSET_4242"))
                .resolve_credentials()
                .unwrap_err();
            assert!(matches!(err, ClientError::Secret(_)));
        }

        #[test]
        fn half_inline_credentials() {
            let err = settings(Some("id"), None).resolve_credentials().unwrap_err();
            assert!(err.to_string().contains("client_secret"));

            let err = settings(None, Some("s")).resolve_credentials().unwrap_err();
            assert!(err.to_string().contains("client_id"));
        }

        #[test]
        fn credentials_file_is_used() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("client_secret.json");
            std::fs::write(
                &path,
                r#"{"installed": {"client_id": "file.apps.googleusercontent.com", "client_secret": "fs"}}"#,
            )
            .unwrap();

            let google = GoogleSettings {
                credentials_file: Some(path),
                ..Default::default()
            };
            let creds = google.resolve_credentials().unwrap();
            assert_eq!(creds.client_id, "file.apps.googleusercontent.com");
        }

        #[test]
        fn inline_credentials_take_priority_over_file() {
            let google = GoogleSettings {
                credentials_file: Some(PathBuf::from("/nonexistent/client_secret.json")),
                ..settings(Some("inline.apps.googleusercontent.com"), Some("s"))
            };
            let creds = google.resolve_credentials().unwrap();
            assert_eq!(creds.client_id, "inline.apps.googleusercontent.com");
        }

        #[test]
        fn google_config_carries_settings() {
            let google = GoogleSettings {
                token_path: Some(PathBuf::from("/tmp/bdaysync-token.json")),
                timeout_secs: 5,
                ..settings(Some("id.apps.googleusercontent.com"), Some("s"))
            };
            let config = google.to_google_config().unwrap();
            assert_eq!(config.token_path, PathBuf::from("/tmp/bdaysync-token.json"));
            assert_eq!(config.timeout, std::time::Duration::from_secs(5));
            assert_eq!(config.loopback_port_range, (8080, 8090));
        }

        #[test]
        fn loopback_ports_reach_google_config() {
            let google = GoogleSettings {
                loopback_ports: Some((9100, 9105)),
                ..settings(Some("id.apps.googleusercontent.com"), Some("s"))
            };
            let config = google.to_google_config().unwrap();
            assert_eq!(config.loopback_port_range, (9100, 9105));
        }

        #[test]
        fn google_config_rejects_malformed_client_id() {
            let err = settings(Some("not-a-google-id"), Some("s"))
                .to_google_config()
                .unwrap_err();
            assert!(err.to_string().contains("invalid Google credentials"));
        }
    }
}
