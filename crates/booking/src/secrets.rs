//! Secret lookup for the store key and the admin password.
//!
//! A secret can come from three places, tried in this order:
//!
//! 1. a direct value in the config (`key`, `password`)
//! 2. a file path (`keyFile`, `passwordFile`), for mounted secrets
//! 3. an environment variable name (`keyEnvVar`, `passwordEnvVar`)

use secrecy::SecretString;
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Secret file '{path}' is empty")]
    EmptyFile { path: String },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the first non-empty source.
///
/// File contents and env var values are trimmed, since both commonly carry a
/// trailing newline.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = non_empty(direct) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = non_empty(file_path) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
            path: expanded.clone(),
            source: e,
        })?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(SecretError::EmptyFile { path: expanded });
        }
        return Ok(SecretString::from(trimmed.to_string()));
    }

    if let Some(name) = non_empty(env_var) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Like [`resolve_secret`], but a missing source is `Ok(None)`.
pub fn resolve_secret_optional(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<Option<SecretString>> {
    match resolve_secret(direct, file_path, env_var) {
        Ok(secret) => Ok(Some(secret)),
        Err(SecretError::NoSourceProvided) => Ok(None),
        Err(e) => Err(e),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Expands a leading `~` or `~/` to the home directory. `~user` is left alone.
pub(crate) fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            if path == "~" {
                return home.into_owned();
            }
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
