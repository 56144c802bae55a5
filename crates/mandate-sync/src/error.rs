use std::path::PathBuf;

use thiserror::Error;

/// Transient failure while asking the remote whether a document exists or
/// while fetching it. Retried by the crawler.
#[derive(Error, Debug)]
pub enum OracleError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("malformed response for {symbol}: {reason}")]
    Malformed { symbol: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] mandate_core::ConfigError),
    #[error("storage error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("sync state {path} is corrupt: {source}")]
    State {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
