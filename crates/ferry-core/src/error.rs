//! Error types for Ferry

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Validation errors: raised before any remote call is made.
    #[error("object is empty; nothing to transfer")]
    EmptyObject,

    #[error("object size {0} exceeds the maximum of {max} bytes", max = crate::MAX_OBJECT_SIZE)]
    ObjectTooLarge(u64),

    #[error("part size {0} is outside the allowed range [{min}, {max}]", min = crate::MIN_PART_SIZE, max = crate::MAX_PART_SIZE)]
    InvalidPartSize(u64),

    #[error("transfer requires {0} parts, exceeding the {max} part limit; increase part size", max = crate::MAX_PARTS)]
    TooManyParts(u64),

    #[error("concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("source is not a regular file: {0}")]
    NotAFile(String),

    // Completion-set integrity errors.
    #[error("part {0} missing at completion")]
    MissingPart(u32),

    #[error("part {0} completed more than once")]
    DuplicatePart(u32),

    // Remote and runtime errors.
    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("transfer cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A multipart upload failed after the remote session was created.
    ///
    /// Carries everything an operator needs to clean up by hand when the
    /// automatic abort did not go through: the upload session id, the
    /// abort outcome, and the original cause.
    #[error("multipart upload {upload_id} failed ({outcome}): {source}")]
    Aborted {
        upload_id: String,
        outcome: AbortOutcome,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// True for errors detected before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyObject
                | Error::ObjectTooLarge(_)
                | Error::InvalidPartSize(_)
                | Error::TooManyParts(_)
                | Error::InvalidConcurrency
                | Error::NotAFile(_)
        )
    }

    /// True if this error (or the cause it wraps) is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Aborted { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// What happened to the remote multipart session during cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortOutcome {
    /// Cleanup was not attempted (disabled, or no session existed).
    NotAttempted,
    /// The abort call succeeded; the remote session is gone.
    Aborted,
    /// The abort call itself failed; the session may still be live.
    Failed(String),
}

impl fmt::Display for AbortOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortOutcome::NotAttempted => write!(f, "abort not attempted"),
            AbortOutcome::Aborted => write!(f, "session aborted"),
            AbortOutcome::Failed(e) => write!(f, "abort failed: {e}"),
        }
    }
}
