//! Octoparse session state: credentials, token cache, and call accounting.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use octoparse::{
    Credentials, Dispatcher, OperationRequest, OutputRecord, TokenCache, DEFAULT_TIMEOUT,
};

use crate::types::McpResult;

/// Where the bearer token for the next call comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    /// `access_token` supplied with the credentials.
    Preset,
    /// Fetched earlier in this session.
    Cached,
    /// Will be fetched on the next call.
    None,
}

/// Snapshot served by `octoparse://session` and the `octoparse_auth` tool.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub base_url: String,
    pub username: String,
    pub token_source: TokenSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_acquired_at: Option<DateTime<Utc>>,
    pub calls: u64,
    pub failed_calls: u64,
    pub started_at: DateTime<Utc>,
}

/// Owns everything needed to dispatch operations on behalf of one host.
///
/// Shared as `Arc<tokio::sync::Mutex<_>>`, so dispatches are serialized and
/// the token cache is never raced.
pub struct OctoparseSession {
    credentials: Credentials,
    cache: TokenCache,
    dispatcher: Dispatcher,
    calls: u64,
    failed_calls: u64,
    started_at: DateTime<Utc>,
    token_acquired_at: Option<DateTime<Utc>>,
}

impl OctoparseSession {
    pub fn new(credentials: Credentials, dispatcher: Dispatcher) -> Self {
        tracing::info!(
            "Session started for {} against {}",
            if credentials.username.is_empty() { "<preset token>" } else { credentials.username.as_str() },
            credentials.base_url()
        );
        Self {
            credentials,
            cache: TokenCache::new(),
            dispatcher,
            calls: 0,
            failed_calls: 0,
            started_at: Utc::now(),
            token_acquired_at: None,
        }
    }

    /// Session backed by a reqwest client with the given timeout.
    pub fn with_timeout(credentials: Credentials, timeout: Duration) -> Self {
        Self::new(credentials, Dispatcher::with_timeout(timeout))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Swap credentials. Any cached token belonged to the old account and is dropped.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
        self.clear_token();
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Dispatch one operation, counting it and tracking token acquisition.
    pub async fn invoke(&mut self, request: &OperationRequest) -> McpResult<Vec<OutputRecord>> {
        self.calls += 1;
        let had_token = self.cache.is_cached();

        let result = self
            .dispatcher
            .dispatch(request, &self.credentials, &mut self.cache)
            .await;

        if !had_token && self.cache.is_cached() {
            self.token_acquired_at = Some(Utc::now());
        }

        match result {
            Ok(records) => Ok(records),
            Err(e) => {
                self.failed_calls += 1;
                Err(e.into())
            }
        }
    }

    /// Make sure a token is available, fetching one when needed.
    ///
    /// With `force`, any cached token is discarded first.
    pub async fn acquire_token(&mut self, force: bool) -> McpResult<SessionStatus> {
        if force {
            self.clear_token();
        }
        let had_token = self.cache.is_cached();
        self.dispatcher
            .tokens()
            .get_access_token(&self.credentials, &mut self.cache)
            .await?;
        if !had_token && self.cache.is_cached() {
            self.token_acquired_at = Some(Utc::now());
        }
        Ok(self.status())
    }

    /// Drop the cached token. Returns whether one was present.
    pub fn clear_token(&mut self) -> bool {
        self.token_acquired_at = None;
        let cleared = self.cache.clear();
        if cleared {
            tracing::info!("Cleared cached access token");
        }
        cleared
    }

    pub fn status(&self) -> SessionStatus {
        let token_source = if self.credentials.preset_token().is_some() {
            TokenSource::Preset
        } else if self.cache.is_cached() {
            TokenSource::Cached
        } else {
            TokenSource::None
        };

        SessionStatus {
            base_url: self.credentials.base_url().to_string(),
            username: self.credentials.username.clone(),
            token_source,
            token_acquired_at: self.token_acquired_at,
            calls: self.calls,
            failed_calls: self.failed_calls,
            started_at: self.started_at,
        }
    }
}

impl Default for OctoparseSession {
    fn default() -> Self {
        Self::with_timeout(Credentials::default(), DEFAULT_TIMEOUT)
    }
}
