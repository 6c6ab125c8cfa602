//! Development-time key bootstrap from a `.dev-env` file.
//!
//! The file is line-oriented `KEY=value`. Only `TRANSIT-API-KEY` is acted
//! on; everything else, including comments and malformed lines, is skipped.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use super::error::StorageError;
use super::store::CredentialStore;

/// Default location of the development env file.
pub const DEFAULT_DEV_ENV_PATH: &str = ".dev-env";

/// Variable holding the Transitland key.
pub const API_KEY_VAR: &str = "TRANSIT-API-KEY";

/// Parse `KEY=value` pairs in file order.
///
/// Blank lines, `#` comments, lines without `=` and lines with an empty key
/// are skipped. One layer of matching single or double quotes is stripped
/// from the value.
pub fn parse_dev_env(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            if key.is_empty() {
                return None;
            }
            Some((key, unquote(value)))
        })
        .collect()
}

/// The API key from env file contents; the last definition wins.
pub fn api_key_from_dev_env(contents: &str) -> Option<&str> {
    parse_dev_env(contents)
        .into_iter()
        .rev()
        .find(|(key, _)| *key == API_KEY_VAR)
        .map(|(_, value)| value)
}

/// Forward the key in the env file at `path` to `store`.
///
/// Returns whether a key was found. A missing file is not an error.
pub fn load_dev_env(path: impl AsRef<Path>, store: &CredentialStore) -> Result<bool, StorageError> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no dev env file");
            return Ok(false);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read dev env file");
            return Err(StorageError::Io {
                message: format!("failed to read {}: {}", path.display(), e),
            });
        }
    };

    match api_key_from_dev_env(&contents) {
        Some(key) => {
            store.set(key)?;
            info!(path = %path.display(), "API key loaded from dev env file");
            Ok(true)
        }
        None => Ok(false),
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
