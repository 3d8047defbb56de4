//! Error taxonomy for the chunk streaming core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("cycle detected at node {node}")]
    CycleError { node: String },

    #[error("node {node} is missing required input port {port}")]
    MissingInputError { node: String, port: String },

    #[error("no intermediate result satisfies sink output {sink}")]
    MissingOutputError { sink: String },

    #[error("node {node} (kind {kind}) failed: {source}")]
    NodeFailure { node: String, kind: String, #[source] source: Box<Error> },

    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error("cache entry at {path:?} is corrupt")]
    CacheCorruption { path: PathBuf },

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
