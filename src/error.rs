use thiserror::Error;

use crate::batch::DocId;

pub type Result<T> = std::result::Result<T, Error>;

/// Problems with what the user asked for. Raised before any document is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no pages specified")]
    NoPages,

    #[error("invalid range")]
    InvalidRange,

    #[error("cannot remove the only page")]
    OnlyPage,

    #[error("no 8-digit identifier found")]
    NoIdentifier,

    #[error("unknown document: {0}")]
    UnknownDocument(DocId),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to process document: {0}")]
    Pdf(String),

    #[error("failed to process document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to process document: {0}")]
    Extraction(String),

    #[error("unsupported document type: {0}")]
    UnsupportedFormat(String),

    #[error("failed to process document: worker aborted ({0})")]
    Aborted(String),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

// lopdf errors are flattened to text so the error stays `Send` across worker threads.
impl From<lopdf::Error> for Error {
    fn from(e: lopdf::Error) -> Self {
        Error::Pdf(e.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Aborted(e.to_string())
    }
}
