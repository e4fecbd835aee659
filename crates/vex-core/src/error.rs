//! Error taxonomy for a scrape cycle.
//!
//! `AuthError` and `DiscoveryError` abort a cycle. `FetchError` and
//! `DecodeError` are contained by the task that hit them.

use thiserror::Error;

/// Login against the analytics backend was rejected or failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Transport(String),

    #[error("login rejected with HTTP status {0}")]
    Rejected(u16),
}

/// The tenant list could not be obtained.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("tenant list request failed: {0}")]
    Transport(String),

    #[error("tenant list returned HTTP status {0}")]
    Status(u16),

    #[error("tenant list body could not be decoded: {0}")]
    Decode(String),
}

/// One tenant/family query failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("upstream returned HTTP status {0}")]
    Status(u16),

    #[error("response body is not valid JSON: {0}")]
    Body(String),
}

/// A response or one of its records does not have the expected shape.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("identity {identity:?} has {found} tokens, expected {expected}")]
    TokenCount {
        identity: String,
        expected: usize,
        found: usize,
    },

    #[error("series value is not a number: {0}")]
    NonNumeric(String),

    #[error("label values do not match the schema of {0}")]
    LabelArity(&'static str),
}

/// Configuration could not be loaded or is incomplete.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type FetchResult<T> = Result<T, FetchError>;
pub type DecodeResult<T> = Result<T, DecodeError>;
