//! Configuration loading and resolution.
//!
//! Each credential field is resolved independently: CLI flag, then
//! `OCTOPARSE_*` environment variable, then the JSON credentials file.

use std::path::{Path, PathBuf};

use octoparse::Credentials;

use crate::types::{McpError, McpResult};

pub const ENV_BASE_URL: &str = "OCTOPARSE_BASE_URL";
pub const ENV_USERNAME: &str = "OCTOPARSE_USERNAME";
pub const ENV_PASSWORD: &str = "OCTOPARSE_PASSWORD";
pub const ENV_ACCESS_TOKEN: &str = "OCTOPARSE_ACCESS_TOKEN";
pub const ENV_CREDENTIALS: &str = "OCTOPARSE_CREDENTIALS";

const CREDENTIALS_FILE: &str = ".octoparse/credentials.json";

/// Credential values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CredentialArgs {
    pub credentials_file: Option<String>,
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub access_token: Option<String>,
}

/// Resolve credentials from flags, the process environment, and disk.
pub fn resolve_credentials(args: &CredentialArgs) -> McpResult<Credentials> {
    resolve_credentials_with(args, |key| std::env::var(key).ok())
}

/// Like [`resolve_credentials`] with an injectable environment lookup.
pub fn resolve_credentials_with(
    args: &CredentialArgs,
    env: impl Fn(&str) -> Option<String>,
) -> McpResult<Credentials> {
    let env = |key: &str| env(key).filter(|v| !v.is_empty());

    let file = match resolve_credentials_path(args.credentials_file.as_deref(), &env) {
        Some(path) => load_credentials_file(&path)?,
        None => Credentials::default(),
    };

    let pick = |flag: &Option<String>, key: &str, from_file: Option<String>| {
        flag.clone()
            .filter(|v| !v.is_empty())
            .or_else(|| env(key))
            .or_else(|| from_file.filter(|v| !v.is_empty()))
    };

    Ok(Credentials {
        base_url: pick(&args.base_url, ENV_BASE_URL, file.base_url),
        username: pick(&args.username, ENV_USERNAME, Some(file.username)).unwrap_or_default(),
        password: pick(&args.password, ENV_PASSWORD, Some(file.password)).unwrap_or_default(),
        access_token: pick(&args.access_token, ENV_ACCESS_TOKEN, file.access_token),
    })
}

/// Locate the credentials file.
///
/// An explicit path (flag or `OCTOPARSE_CREDENTIALS`) is returned even if it
/// does not exist, so loading reports the error. Default locations are only
/// returned when present.
pub fn resolve_credentials_path(
    explicit: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }

    if let Some(path) = env(ENV_CREDENTIALS) {
        return Some(PathBuf::from(path));
    }

    let cwd_file = PathBuf::from(CREDENTIALS_FILE);
    if cwd_file.exists() {
        return Some(cwd_file);
    }

    let home = env("HOME").or_else(|| env("USERPROFILE"))?;
    let home_file = PathBuf::from(home).join(CREDENTIALS_FILE);
    home_file.exists().then_some(home_file)
}

/// Read a JSON credentials file (`baseUrl`, `username`, `password`, `access_token`).
pub fn load_credentials_file(path: &Path) -> McpResult<Credentials> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        McpError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read credentials file {}: {e}", path.display()),
        ))
    })?;

    let creds: Credentials = serde_json::from_str(&raw).map_err(|e| {
        McpError::InvalidParams(format!("Invalid credentials file {}: {e}", path.display()))
    })?;

    tracing::debug!("Loaded credentials from {}", path.display());
    Ok(creds)
}
