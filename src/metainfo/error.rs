use thiserror::Error;

/// Failure taxonomy for torrent creation.
///
/// Validation errors surface before any hashing begins; read errors are
/// fatal for the run; cancellation is a neutral outcome, not a fault.
/// Nothing is retried internally.
#[derive(Debug, Error)]
pub enum CreateError {
    /// Input rejected by the validator; the message is shown verbatim.
    #[error("{0}")]
    Validation(String),

    /// A source file could not be read to its declared length.
    #[error("Error reading file: {path}. The file might be inaccessible, or might have been modified, moved, or deleted.")]
    Io { path: String },

    /// The job id was superseded by a newer run.
    #[error("cancelled")]
    Cancelled,
}

impl CreateError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CreateError::Cancelled)
    }
}
