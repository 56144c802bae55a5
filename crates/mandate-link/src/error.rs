use thiserror::Error;

/// Failure to turn a source file into a [`mandate_core::StructuredDocument`].
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{symbol}: binary content, convert to text first")]
    Binary { symbol: String },

    #[error("{symbol}: document is empty")]
    Empty { symbol: String },

    #[error("{symbol}: no title or paragraphs found")]
    NoContent { symbol: String },
}

impl ExtractionError {
    pub fn symbol(&self) -> &str {
        match self {
            Self::Binary { symbol } | Self::Empty { symbol } | Self::NoContent { symbol } => symbol,
        }
    }
}
