//! Bearer token acquisition and the caller-owned token cache.

use serde_json::{json, Value};

use crate::catalog::HttpMethod;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{AccessToken, Credentials, OctoparseError, OctoparseResult};

/// Holds at most one token between dispatches.
///
/// The cache never expires on its own; it is emptied only by [`TokenCache::clear`].
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    token: Option<AccessToken>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn store(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    /// Drop the cached token. Returns whether one was present.
    pub fn clear(&mut self) -> bool {
        self.token.take().is_some()
    }

    pub fn is_cached(&self) -> bool {
        self.token.is_some()
    }
}

/// Resolves bearer tokens, calling `POST /token` only on a miss.
pub struct TokenProvider<'a> {
    transport: &'a dyn HttpTransport,
}

impl<'a> TokenProvider<'a> {
    pub fn new(transport: &'a dyn HttpTransport) -> Self {
        Self { transport }
    }

    /// Return the preset token, else the cached one, else fetch and cache a new one.
    pub async fn get_access_token(
        &self,
        credentials: &Credentials,
        cache: &mut TokenCache,
    ) -> OctoparseResult<AccessToken> {
        if let Some(preset) = credentials.preset_token() {
            return Ok(AccessToken::new(preset));
        }

        if let Some(cached) = cache.get() {
            tracing::debug!("Reusing cached access token");
            return Ok(cached.clone());
        }

        let token = self.request_token(credentials).await?;
        cache.store(token.clone());
        Ok(token)
    }

    /// Exchange username/password for a fresh token, bypassing every cache.
    pub async fn request_token(&self, credentials: &Credentials) -> OctoparseResult<AccessToken> {
        if credentials.username.is_empty() {
            return Err(OctoparseError::MissingCredential("username"));
        }
        if credentials.password.is_empty() {
            return Err(OctoparseError::MissingCredential("password"));
        }

        let url = format!("{}/token", credentials.base_url());
        tracing::info!("Requesting access token for {} from {url}", credentials.username);

        let request = HttpRequest::new(HttpMethod::Post, url)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json")
            .with_json(json!({
                "username": credentials.username,
                "password": credentials.password,
                "grant_type": "password",
            }));

        let response = self.transport.send(request).await?;
        extract_token(&response)
    }
}

/// Pull `data.access_token` out of a token endpoint response.
fn extract_token(response: &Value) -> OctoparseResult<AccessToken> {
    response
        .get("data")
        .and_then(|data| data.get("access_token"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(AccessToken::new)
        .ok_or_else(|| {
            let reason = response
                .get("error_Description")
                .or_else(|| response.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("response did not contain data.access_token");
            OctoparseError::Auth(reason.to_string())
        })
}
