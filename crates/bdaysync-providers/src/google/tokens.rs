//! Persisted OAuth tokens.
//!
//! The token file is JSON, rewritten atomically (temp file + rename) after
//! every authorization or refresh, and readable only by the owner on Unix.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Seconds shaved off the reported lifetime so a token is renewed before the
/// server starts rejecting it.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An authorized token set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The access token sent as a bearer credential.
    pub access_token: String,
    /// The refresh token, used to obtain new access tokens.
    pub refresh_token: Option<String>,
    /// When the access token expires, less the safety margin.
    pub expires_at: Option<DateTime<Utc>>,
    /// Scopes granted at authorization time.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// When the access token was last obtained.
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    /// Creates a token set from a token endpoint response.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(|secs| expiry_from(now, secs)),
            scopes,
            last_refresh: now,
        }
    }

    /// Returns true if the access token is expired or about to expire.
    ///
    /// Tokens without an expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Returns true if a refresh token is available.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Returns true if every required scope was granted.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh.
    ///
    /// Google may rotate the refresh token; a new one replaces the old.
    pub fn apply_refresh(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
        refresh_token: Option<String>,
    ) {
        let now = Utc::now();
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(|secs| expiry_from(now, secs));
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.last_refresh = now;
    }
}

fn expiry_from(now: DateTime<Utc>, expires_in_secs: i64) -> DateTime<Utc> {
    now + Duration::seconds(expires_in_secs) - Duration::seconds(EXPIRY_MARGIN_SECS)
}

/// File-backed token storage with an in-memory copy.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
    tokens: RwLock<Option<TokenInfo>>,
}

impl TokenStorage {
    /// Creates storage backed by `path`; nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tokens: RwLock::new(None),
        }
    }

    /// Loads the token file into memory.
    ///
    /// Returns `Ok(false)` if there is no token file.
    pub fn load(&self) -> ProviderResult<bool> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no token file");
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read token file {}",
                self.path.display()
            ))
            .with_source(e)
        })?;

        let tokens: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to parse token file {}",
                self.path.display()
            ))
            .with_source(e)
        })?;

        info!(path = %self.path.display(), "loaded token");
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
        Ok(true)
    }

    /// Returns a copy of the current tokens, if any.
    pub fn get(&self) -> Option<TokenInfo> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the tokens and writes them to disk.
    pub fn set(&self, tokens: TokenInfo) -> ProviderResult<()> {
        write_token_file(&self.path, &tokens)?;
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = Some(tokens);
        Ok(())
    }

    /// Removes the tokens from memory and disk.
    pub fn clear(&self) -> ProviderResult<()> {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                ProviderError::configuration("failed to remove token file").with_source(e)
            })?;
            info!(path = %self.path.display(), "removed token");
        }
        Ok(())
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if re-authorization is needed: no token, or a token that
    /// lacks some of the required scopes.
    pub fn needs_reauth(&self, required_scopes: &[String]) -> bool {
        match self.get() {
            None => true,
            Some(tokens) => !tokens.has_scopes(required_scopes),
        }
    }
}

fn write_token_file(path: &Path, tokens: &TokenInfo) -> ProviderResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ProviderError::configuration(format!(
                "failed to create token directory {}",
                parent.display()
            ))
            .with_source(e)
        })?;
    }

    let content = serde_json::to_string_pretty(tokens).map_err(|e| {
        ProviderError::internal("failed to serialize token").with_source(e)
    })?;

    let temp_path = path.with_extension("json.tmp");
    write_private(&temp_path, content.as_bytes()).map_err(|e| {
        ProviderError::configuration(format!("failed to write {}", temp_path.display()))
            .with_source(e)
    })?;
    fs::rename(&temp_path, path).map_err(|e| {
        ProviderError::configuration(format!("failed to replace {}", path.display()))
            .with_source(e)
    })?;

    debug!(path = %path.display(), "saved token");
    Ok(())
}

/// Writes `content` to a file only the owner can read.
///
/// The mode is set on an already existing file too, since `mode()` only
/// applies at creation.
#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
