//! Error types
//!
//! Field misses are not errors: a field whose selector matches nothing is
//! stored as `None` in its record.

use thiserror::Error;

/// Invalid extraction schema. Raised when a schema is compiled, never while
/// extracting.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid base selector `{selector}`: {reason}")]
    InvalidBaseSelector { selector: String, reason: String },

    #[error("field `{field}` has invalid selector `{selector}`: {reason}")]
    InvalidFieldSelector {
        field: String,
        selector: String,
        reason: String,
    },

    #[error("field `{field}` uses attribute mode but names no attribute")]
    MissingAttribute { field: String },

    #[error("field `{field}` names attribute `{attribute}` but is not in attribute mode")]
    UnexpectedAttribute { field: String, attribute: String },

    #[error("field name `{0}` is used more than once")]
    DuplicateField(String),

    #[error("field at position {0} has an empty name")]
    EmptyFieldName(usize),

    #[error("failed to parse schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read schema file `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The input document could not be decoded as text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidEncoding { offset: usize },
}

/// Failure of a document source. The caller reports it and skips extraction.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme `{0}` (expected http or https)")]
    UnsupportedScheme(String),

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Any error the crate can produce, for callers chaining fetch, schema
/// loading and extraction.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
