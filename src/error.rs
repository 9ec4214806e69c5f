use std::fmt;
use std::io;

use crate::dom::DomError;

pub type Result<T> = std::result::Result<T, MarkError>;

/// Why a caller-supplied range was not wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRejection {
    /// Non-numeric start/length, negative start or non-positive length.
    BadBounds,
    /// Start lies outside the text, or clipping left nothing to wrap.
    OutOfBounds,
    /// Overlaps a range accepted earlier in the same batch.
    Overlap,
    WhitespaceOnly,
}

impl fmt::Display for RangeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeRejection::BadBounds => write!(f, "invalid range bounds"),
            RangeRejection::OutOfBounds => write!(f, "range outside of text"),
            RangeRejection::Overlap => write!(f, "range overlaps a previous range"),
            RangeRejection::WhitespaceOnly => write!(f, "whitespace only range"),
        }
    }
}

#[derive(Debug)]
pub enum MarkError {
    ConfigurationInvalid(String),
    RangeRejected {
        start: Option<i64>,
        length: Option<i64>,
        reason: RangeRejection,
    },
    SubtreeUnavailable { src: String, reason: String },
    Parse(String),
    Pattern(regex::Error),
    Dom(DomError),
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for MarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkError::ConfigurationInvalid(msg) => write!(f, "invalid configuration: {}", msg),
            MarkError::RangeRejected {
                start,
                length,
                reason,
            } => write!(
                f,
                "range rejected (start: {:?}, length: {:?}): {}",
                start, length, reason
            ),
            MarkError::SubtreeUnavailable { src, reason } => {
                write!(f, "sub-tree {} unavailable: {}", src, reason)
            }
            MarkError::Parse(msg) => write!(f, "HTML parse error: {}", msg),
            MarkError::Pattern(e) => write!(f, "pattern error: {}", e),
            MarkError::Dom(e) => write!(f, "document error: {}", e),
            MarkError::Io(e) => write!(f, "IO error: {}", e),
            MarkError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for MarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarkError::Pattern(e) => Some(e),
            MarkError::Dom(e) => Some(e),
            MarkError::Io(e) => Some(e),
            MarkError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<regex::Error> for MarkError {
    fn from(e: regex::Error) -> Self {
        MarkError::Pattern(e)
    }
}

impl From<DomError> for MarkError {
    fn from(e: DomError) -> Self {
        MarkError::Dom(e)
    }
}

impl From<io::Error> for MarkError {
    fn from(e: io::Error) -> Self {
        MarkError::Io(e)
    }
}

impl From<serde_json::Error> for MarkError {
    fn from(e: serde_json::Error) -> Self {
        MarkError::Json(e)
    }
}
