//! Error taxonomy for directive processing and defect retrieval.
//!
//! `ConfigError` is fatal to the single block that declared the bad option;
//! the surrounding build keeps going. `RetrievalError` is fatal to every
//! block sharing the failed (stream, snapshot) key and is reported once.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown column name '{0}'")]
    UnknownColumn(String),

    #[error("unknown attribute name '{0}'")]
    UnknownAttribute(String),

    #[error("widths option lists {got} weights for {expected} columns")]
    WidthCountMismatch { expected: usize, got: usize },

    #[error("invalid width '{0}': widths must be positive integers")]
    InvalidWidth(String),

    #[error("chart groups overlap on attribute value '{0}'")]
    OverlappingGroups(String),

    #[error("invalid chart option '{0}'")]
    InvalidChart(String),

    #[error("invalid cid value '{0}'")]
    InvalidCid(String),

    #[error("invalid checker pattern '{pattern}': {reason}")]
    InvalidCheckerPattern { pattern: String, reason: String },

    #[error("invalid traceability id pattern: {0}")]
    InvalidIdPattern(#[from] regex::Error),

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("'{0}' is a required credential; set it in covlist.toml or pass the matching flag")]
    MissingCredential(&'static str),

    #[error("failed to read report file '{path}': {reason}")]
    ReportRead { path: String, reason: String },

    #[error("report file '{path}' is not valid TOML: {reason}")]
    ReportParse { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("no such stream '{0}' on the server")]
    UnknownStream(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("defect retrieval already failed for this stream/snapshot: {message}")]
    PreviouslyFailed { message: String },
}

/// Either failure mode of a single directive run.
#[derive(Error, Debug)]
pub enum DirectiveError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}
