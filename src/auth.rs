//! Credential resolution.
//!
//! Resolution order:
//! 1) Explicit key passed to the client builder
//! 2) Environment variable `GEMINI_API_KEY` (then `GOOGLE_API_KEY`)
//! 3) Credential file at `$XDG_CONFIG_HOME/converse/api_key`
//!    (or `~/.config/converse/api_key`), one trimmed line
//!
//! Resolution happens once at client construction. The resolved key is held
//! as a [`SecretString`] so it never appears in `Debug` output.

use secrecy::SecretString;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Environment variables consulted, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Resolve an API key from the explicit parameter, the environment, or the
/// platform credential file, in that priority order.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<SecretString> {
    if let Some(key) = explicit {
        if !key.is_empty() {
            return Ok(SecretString::from(key.to_string()));
        }
    }

    for var in API_KEY_ENV_VARS {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                tracing::debug!(source = var, "resolved API key from environment");
                return Ok(SecretString::from(key));
            }
        }
    }

    if let Some(path) = credential_file_path() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            let key = contents.trim();
            if !key.is_empty() {
                tracing::debug!(path = %path.display(), "resolved API key from credential file");
                return Ok(SecretString::from(key.to_string()));
            }
        }
    }

    Err(Error::Authentication(
        "no API key: pass one explicitly, set GEMINI_API_KEY, or create the credential file"
            .to_string(),
    ))
}

/// Well-known credential file location, if a config directory can be derived.
pub fn credential_file_path() -> Option<PathBuf> {
    let config_dir = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let home = std::env::var("HOME").ok().filter(|h| !h.is_empty())?;
            PathBuf::from(home).join(".config")
        }
    };
    Some(config_dir.join("converse").join("api_key"))
}
