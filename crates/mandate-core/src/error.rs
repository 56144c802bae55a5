use std::path::PathBuf;

use thiserror::Error;

/// Configuration-level failure. Always fatal, raised before any I/O.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pattern config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("pattern name must not be empty")]
    EmptyName,

    #[error("duplicate pattern name: {0}")]
    DuplicateName(String),

    #[error("pattern {pattern}: malformed template {template:?}: {reason}")]
    Template {
        pattern: String,
        template: String,
        reason: String,
    },

    #[error("pattern {0}: template has no {{number}} placeholder")]
    MissingNumber(String),

    #[error("pattern {pattern}: placeholder {{{placeholder}}} has no value")]
    UnboundPlaceholder { pattern: String, placeholder: String },

    #[error("pattern {pattern}: variable {name:?} is reserved")]
    ReservedVariable { pattern: String, name: String },
}
