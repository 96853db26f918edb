//! Credentials loading for wrtlink.
//!
//! The credentials file is JSON with three string fields -- `host`,
//! `username`, `password` -- looked up under the platform config directory
//! unless an explicit path is given. `WRTLINK_`-prefixed environment
//! variables override individual fields. An empty or missing value for any
//! field is an incomplete configuration and blocks connection attempts; this
//! crate never creates or repairs the file.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Json},
};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use wrtlink_core::Credentials;

/// File name under the platform config directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("credentials file not found: {path}")]
    Missing { path: String },

    #[error("incomplete configuration: {field} is empty (edit the credentials file)")]
    Incomplete { field: &'static str },

    #[error("no usable config directory on this platform")]
    NoConfigDir,

    #[error("credentials loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Raw file shape. Serde defaults let a partially-filled file surface as an
/// `Incomplete` error instead of a parse error.
#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    host: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Default credentials file location under the platform config directory.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("", "", "wrtlink").ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join(CREDENTIALS_FILE))
}

/// Load credentials from `path`, or from the default location.
pub fn load(path: Option<&Path>) -> Result<Credentials, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_path()?,
    };
    if !path.exists() {
        return Err(ConfigError::Missing {
            path: path.display().to_string(),
        });
    }

    let raw: CredentialsFile = Figment::new()
        .merge(Json::file(&path))
        .merge(Env::prefixed("WRTLINK_"))
        .extract()?;

    validate(raw)
}

fn validate(raw: CredentialsFile) -> Result<Credentials, ConfigError> {
    if raw.host.trim().is_empty() {
        return Err(ConfigError::Incomplete { field: "host" });
    }
    if raw.username.trim().is_empty() {
        return Err(ConfigError::Incomplete { field: "username" });
    }
    if raw.password.is_empty() {
        return Err(ConfigError::Incomplete { field: "password" });
    }
    Ok(Credentials {
        host: raw.host,
        username: raw.username,
        password: SecretString::from(raw.password),
    })
}
