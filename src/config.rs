//! Optional configuration inputs: the tab list, the flat credentials map,
//! and the per-adapter symbol-translation table. All three are genuinely
//! optional — a missing file falls back to an empty default, never a hard
//! error, grounded in
//! `examples/original_source/src/market_feed/manager.py`'s
//! `_load_config`/`_load_keys_from_file`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{Credentials, TabConfig};

fn try_read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let body = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Loads the list of [`TabConfig`] from a JSON file. Returns an empty `Vec`
/// if the file is missing or fails to parse — this is the `ConfigAbsent`
/// error kind, logged but never propagated.
pub fn load_market_config(path: impl AsRef<Path>) -> Vec<TabConfig> {
    match try_read_json(path.as_ref()) {
        Ok(config) => config,
        Err(err @ ConfigError::Read { .. }) => {
            tracing::info!(error = %err, "no market config found, using empty config");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "market config is not valid JSON, using empty config");
            Vec::new()
        }
    }
}

/// Loads a flat credentials map from a JSON file. Returns an empty map on
/// any failure, same `ConfigAbsent` treatment as [`load_market_config`].
pub fn load_credentials(path: impl AsRef<Path>) -> Credentials {
    match try_read_json(path.as_ref()) {
        Ok(creds) => creds,
        Err(ConfigError::Read { .. }) => HashMap::new(),
        Err(err) => {
            tracing::warn!(error = %err, "credentials file is not valid JSON, using empty credentials");
            HashMap::new()
        }
    }
}

/// A translation directive cell, parsed from the raw CSV string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `exact:<v>` — canonical `symbol` maps directly to the literal vendor
    /// string `v` (and `v` maps back to `symbol`).
    Exact(String),
    /// `index` — the symbol is an index-class reference.
    Index,
    /// `futureprefix` — the symbol is a futures-code prefix.
    FuturePrefix,
}

impl Directive {
    pub fn parse(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        let lower = cell.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("exact:") {
            // Preserve the original casing of the value, only the directive
            // keyword itself is case-insensitive.
            let value = cell[cell.len() - value.len()..].trim().to_string();
            return Some(Self::Exact(value));
        }
        match lower.as_str() {
            "index" => Some(Self::Index),
            "futureprefix" => Some(Self::FuturePrefix),
            _ => None,
        }
    }
}

/// Parses the rows of a symbol-translation CSV for one adapter's column.
/// Missing file or missing column for `adapter_key` yields an empty `Vec` —
/// again `ConfigAbsent`, not an error.
///
/// Reads `StringRecord`s directly rather than deriving through
/// `#[serde(flatten)]`, which the `csv` crate's positional deserializer
/// doesn't support for a variable column set.
pub fn load_symbol_table(path: impl AsRef<Path>, adapter_key: &str) -> Vec<(String, Directive)> {
    let path = path.as_ref();
    let body = match std::fs::read_to_string(path) {
        Ok(body) => body,
        Err(_) => return Vec::new(),
    };

    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(_) => return Vec::new(),
    };
    let Some(symbol_col) = headers.iter().position(|h| h == "Symbol") else {
        return Vec::new();
    };
    let Some(adapter_col) = headers.iter().position(|h| h == adapter_key) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for record in reader.records().flatten() {
        let (Some(symbol), Some(cell)) = (record.get(symbol_col), record.get(adapter_col)) else {
            continue;
        };
        if let Some(directive) = Directive::parse(cell) {
            out.push((symbol.trim().to_string(), directive));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_parsing() {
        assert_eq!(
            Directive::parse("exact:BTC_USDC"),
            Some(Directive::Exact("BTC_USDC".to_string()))
        );
        assert_eq!(Directive::parse("Index"), Some(Directive::Index));
        assert_eq!(
            Directive::parse("futurePrefix"),
            Some(Directive::FuturePrefix)
        );
        assert_eq!(Directive::parse(""), None);
        assert_eq!(Directive::parse("garbage"), None);
    }

    #[test]
    fn missing_market_config_is_empty_not_an_error() {
        assert!(load_market_config("/nonexistent/market_config.json").is_empty());
    }

    #[test]
    fn missing_symbol_table_is_empty_not_an_error() {
        assert!(load_symbol_table("/nonexistent/feed_instruments.csv", "deribit").is_empty());
    }
}
