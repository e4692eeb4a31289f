use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IngestError {
    /// Pre-parse rejection: wrong extension, file too large, too many rows.
    Validation(String),
    /// The file decoded but no usable header/columns/rows came out of it.
    Parse(String),
    /// Raw bytes could not be decoded into a cell grid at all.
    Decode(String),
    /// A batch or status call failed; the whole submission is aborted.
    Transport(String),
    /// The caller cancelled an in-flight submission.
    Cancelled,
    IoError(String),
    Internal(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Validation(msg) => write!(f, "Validation error: {}", msg),
            IngestError::Parse(msg) => write!(f, "Parse error: {}", msg),
            IngestError::Decode(msg) => write!(f, "Decode error: {}", msg),
            IngestError::Transport(msg) => write!(f, "Transport error: {}", msg),
            IngestError::Cancelled => write!(f, "Submission cancelled"),
            IngestError::IoError(msg) => write!(f, "IO error: {}", msg),
            IngestError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
