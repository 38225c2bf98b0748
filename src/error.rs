use thiserror::Error;

/// Errors surfaced by the configuration loaders.
///
/// None of these ever escape [`crate::manager::FeedManager::bootstrap`] as a
/// hard failure — a missing or malformed optional file degrades to the
/// built-in default (empty config / empty translation table) per the
/// `ConfigAbsent` error kind. They exist so the loaders can be unit tested
/// and so a host that *wants* to know why a file was ignored can log it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
