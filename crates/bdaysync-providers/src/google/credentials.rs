//! Access-token acquisition backed by the persisted token file.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{AccessToken, BoxFuture, CredentialProvider};

use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::{TokenInfo, TokenStorage};

const PROVIDER_NAME: &str = "google-oauth";

/// What to do with the stored token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenAction {
    Use(String),
    Refresh(String),
    Authorize,
}

fn plan(tokens: Option<&TokenInfo>, scopes: &[String]) -> TokenAction {
    match tokens {
        None => TokenAction::Authorize,
        Some(tokens) if !tokens.has_scopes(scopes) => TokenAction::Authorize,
        Some(tokens) if !tokens.is_expired() => TokenAction::Use(tokens.access_token.clone()),
        Some(TokenInfo {
            refresh_token: Some(refresh),
            ..
        }) => TokenAction::Refresh(refresh.clone()),
        Some(_) => TokenAction::Authorize,
    }
}

/// Yields Google access tokens, refreshing or re-authorizing as needed.
///
/// Acquisition is serialized, so concurrent callers never trigger two
/// consent flows or two refreshes.
pub struct GoogleCredentialProvider {
    config: GoogleConfig,
    storage: TokenStorage,
    oauth: OAuthClient,
    interactive: bool,
    guard: Mutex<()>,
}

impl GoogleCredentialProvider {
    /// Creates the provider and loads any stored token.
    ///
    /// An unreadable token file is logged and treated as absent.
    pub fn new(config: GoogleConfig, http: reqwest::Client) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(PROVIDER_NAME))?;

        let storage = TokenStorage::new(&config.token_path);
        if let Err(e) = storage.load() {
            warn!(error = %e, "ignoring unreadable token file");
        }

        let oauth = OAuthClient::new(config.credentials.clone(), http);

        Ok(Self {
            config,
            storage,
            oauth,
            interactive: true,
            guard: Mutex::new(()),
        })
    }

    /// Disables the browser consent flow; a missing or unusable token
    /// becomes an authentication error instead.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Where the token is persisted.
    pub fn token_path(&self) -> &std::path::Path {
        self.storage.path()
    }

    /// Returns true if a stored token covers every required scope.
    ///
    /// An expired token with a refresh token still counts.
    pub fn is_authorized(&self) -> bool {
        !self.storage.needs_reauth(&self.config.scopes)
    }

    /// Runs the consent flow even when a usable token is stored.
    pub async fn reauthorize(&self) -> ProviderResult<()> {
        let _guard = self.guard.lock().await;
        self.authorize()
            .await
            .map(|_| ())
            .map_err(|e| e.with_provider(PROVIDER_NAME))
    }

    /// Forgets the stored token.
    pub fn logout(&self) -> ProviderResult<()> {
        self.storage
            .clear()
            .map_err(|e| e.with_provider(PROVIDER_NAME))
    }

    async fn acquire(&self) -> ProviderResult<AccessToken> {
        let _guard = self.guard.lock().await;

        match plan(self.storage.get().as_ref(), &self.config.scopes) {
            TokenAction::Use(token) => {
                debug!("using stored access token");
                Ok(AccessToken::new(token))
            }
            TokenAction::Refresh(refresh_token) => match self.refresh(&refresh_token).await {
                Ok(token) => Ok(token),
                Err(e) if e.code() == ProviderErrorCode::AuthenticationFailed && self.interactive => {
                    warn!(error = %e, "refresh rejected, re-authorizing");
                    self.authorize().await
                }
                Err(e) => Err(e),
            },
            TokenAction::Authorize => self.authorize().await,
        }
    }

    async fn refresh(&self, refresh_token: &str) -> ProviderResult<AccessToken> {
        debug!("refreshing expired access token");
        let response = self.oauth.refresh(refresh_token).await?;

        let mut tokens = self
            .storage
            .get()
            .ok_or_else(|| ProviderError::internal("token disappeared during refresh"))?;
        tokens.apply_refresh(
            response.access_token,
            response.expires_in,
            response.refresh_token,
        );
        let token = AccessToken::new(tokens.access_token.clone());
        self.storage.set(tokens)?;
        Ok(token)
    }

    async fn authorize(&self) -> ProviderResult<AccessToken> {
        if !self.interactive {
            return Err(ProviderError::authentication(
                "no usable token and interactive authorization is disabled",
            ));
        }

        info!("authorization required");
        let tokens = self
            .oauth
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        let token = AccessToken::new(tokens.access_token.clone());
        self.storage.set(tokens)?;
        info!(path = %self.storage.path().display(), "token saved");
        Ok(token)
    }
}

impl CredentialProvider for GoogleCredentialProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn credentials(&self) -> BoxFuture<'_, ProviderResult<AccessToken>> {
        Box::pin(async move {
            self.acquire()
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}
