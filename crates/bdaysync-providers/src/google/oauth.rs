//! OAuth 2.0 authorization code flow with PKCE (RFC 7636) for desktop apps.
//!
//! The browser is sent to Google's consent page with a SHA-256 code
//! challenge; Google redirects back to a one-shot HTTP listener on
//! 127.0.0.1, and the received code is exchanged together with the verifier.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;
use super::tokens::TokenInfo;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Verifier entropy in bytes, before base64 encoding.
const CODE_VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 16;

/// How long the user has to finish the consent screen.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PATH: &str = "/callback";

/// A successful redirect back from the consent page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub code: String,
    pub state: String,
}

/// Body of a token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Talks to Google's authorization and token endpoints.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(credentials: OAuthCredentials, http: reqwest::Client) -> Self {
        Self { credentials, http }
    }

    /// Runs the interactive consent flow and returns fresh tokens.
    ///
    /// # Errors
    ///
    /// Fails if no loopback port in `port_range` is free, the user denies
    /// access, the callback does not arrive in time, or the code exchange
    /// is rejected.
    pub async fn authorize(
        &self,
        scopes: &[String],
        port_range: (u16, u16),
    ) -> ProviderResult<TokenInfo> {
        let pkce = PkceFlow::new();

        let (listener, port) = bind_loopback(port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);
        let auth_url = pkce.build_auth_url(&self.credentials.client_id, &redirect_uri, scopes);

        info!("opening browser for Google authorization");
        debug!(url = %auth_url, "authorization URL");
        if let Err(e) = open::that(&auth_url) {
            warn!(error = %e, "failed to open browser");
            eprintln!("\nOpen this URL in your browser to authorize bdaysync:\n\n{}\n", auth_url);
        }

        let callback = wait_for_callback(listener).await?;
        if callback.state != pkce.state {
            return Err(ProviderError::authentication(
                "OAuth state mismatch in callback",
            ));
        }

        info!("authorization code received");
        let response = self
            .exchange_code(&callback.code, &pkce.verifier, &redirect_uri)
            .await?;

        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            scopes.to_vec(),
        ))
    }

    /// Trades a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<TokenResponse> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        let response = self.token_request(&params, "token refresh").await?;
        info!("access token refreshed");
        Ok(response)
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> ProviderResult<TokenResponse> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];
        self.token_request(&params, "token exchange").await
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(params)
            .send()
            .await
            .map_err(super::request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what,
                status,
                body.trim()
            )));
        }

        super::read_json(response).await
    }
}

fn bind_loopback(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            debug!(port, "loopback listener bound");
            return Ok((listener, port));
        }
    }
    Err(ProviderError::configuration(format!(
        "no available loopback port in range {}-{}",
        port_range.0, port_range.1
    )))
}

/// Accepts connections until one carries the OAuth redirect.
///
/// The accept loop runs on its own thread; the async side only waits on a
/// channel, so the runtime is not blocked.
async fn wait_for_callback(listener: TcpListener) -> ProviderResult<AuthorizationCode> {
    let (tx, rx) = oneshot::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Some(result) = serve_callback(stream) {
                        let _ = tx.send(result);
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "failed to accept loopback connection"),
            }
        }
    });

    match tokio::time::timeout(CALLBACK_TIMEOUT, rx).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(ProviderError::internal("loopback listener stopped")),
        Err(_) => Err(ProviderError::authentication(
            "timed out waiting for authorization",
        )),
    }
}

fn serve_callback(mut stream: TcpStream) -> Option<ProviderResult<AuthorizationCode>> {
    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let result = parse_callback(&request_line)?;

    let page = if result.is_ok() {
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
         <html><body><h1>bdaysync is authorized</h1>\
         <p>You can close this window.</p></body></html>"
    } else {
        "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
         <html><body><h1>Authorization failed</h1>\
         <p>Return to the terminal for details.</p></body></html>"
    };
    let _ = stream.write_all(page.as_bytes());
    let _ = stream.flush();

    Some(result)
}

/// Parses the request line of the redirect, e.g.
/// `GET /callback?code=...&state=... HTTP/1.1`.
///
/// Returns `None` for requests that are not the redirect (favicon and the
/// like), so the listener keeps waiting.
pub(crate) fn parse_callback(request_line: &str) -> Option<ProviderResult<AuthorizationCode>> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = parts.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != CALLBACK_PATH {
        return None;
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = decode_component(value);
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => error = Some(value),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(ProviderError::authentication(format!(
            "authorization denied: {}",
            error
        ))));
    }

    Some(match code {
        Some(code) => Ok(AuthorizationCode {
            code,
            state: state.unwrap_or_default(),
        }),
        None => Err(ProviderError::authentication(
            "missing authorization code in callback",
        )),
    })
}

fn decode_component(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|v| v.into_owned())
        .unwrap_or(value)
}

/// PKCE verifier, challenge and CSRF state for one authorization attempt.
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_BYTES);
        let challenge = Self::challenge_for(&verifier);
        Self {
            verifier,
            challenge,
            state: random_token(STATE_BYTES),
        }
    }

    /// S256 challenge: base64url(sha256(verifier)) without padding.
    pub fn challenge_for(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        let scope = scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}\
             &code_challenge={}&code_challenge_method=S256&state={}\
             &access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    #[test]
    fn verifier_is_43_chars() {
        // 32 bytes base64url without padding
        assert_eq!(PkceFlow::new().verifier.len(), 43);
    }

    #[test]
    fn challenge_matches_rfc7636_example() {
        // Appendix B of RFC 7636.
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            PkceFlow::challenge_for(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn flows_are_random() {
        let a = PkceFlow::new();
        let b = PkceFlow::new();
        assert_ne!(a.verifier, b.verifier);
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn auth_url_carries_pkce_and_offline_access() {
        let flow = PkceFlow::new();
        let url = flow.build_auth_url(
            "id.apps.googleusercontent.com",
            "http://127.0.0.1:8080/callback",
            &[
                "https://www.googleapis.com/auth/contacts.readonly".to_string(),
                "https://www.googleapis.com/auth/calendar".to_string(),
            ],
        );

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8080%2Fcallback"));
        assert!(url.contains("contacts.readonly%20https"));
        assert!(url.contains(&format!("code_challenge={}", flow.challenge)));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn callback_with_code_and_state() {
        let parsed = parse_callback("GET /callback?state=abc&code=4%2F0Ab_x HTTP/1.1\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed,
            AuthorizationCode {
                code: "4/0Ab_x".to_string(),
                state: "abc".to_string(),
            }
        );
    }

    #[test]
    fn callback_with_error() {
        let err = parse_callback("GET /callback?error=access_denied&state=abc HTTP/1.1")
            .unwrap()
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("access_denied"));
    }

    #[test]
    fn callback_without_code() {
        let err = parse_callback("GET /callback?state=abc HTTP/1.1")
            .unwrap()
            .unwrap_err();
        assert!(err.message().contains("missing authorization code"));
    }

    #[test]
    fn unrelated_requests_are_ignored() {
        assert!(parse_callback("GET /favicon.ico HTTP/1.1").is_none());
        assert!(parse_callback("POST /callback?code=x HTTP/1.1").is_none());
        assert!(parse_callback("GET /callbacks?code=x HTTP/1.1").is_none());
        assert!(parse_callback("").is_none());
    }

    #[test]
    fn token_response_optional_fields() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "ya29.x", "token_type": "Bearer"}"#).unwrap();
        assert_eq!(response.access_token, "ya29.x");
        assert!(response.refresh_token.is_none());
        assert!(response.expires_in.is_none());
    }
}
