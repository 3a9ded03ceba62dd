//! Error types for the spam classifier core.
//!
//! Every fallible core operation returns [`Result`]. Training-time failures
//! (`Dataset`, `MissingColumn`, `InvalidLabel`, `Csv`) abort the offline run;
//! artifact failures (`Artifact`, `ArtifactMismatch`, `Io`) put the prediction
//! runtime into degraded mode; per-message failures (`Input`, `Vectorizer`)
//! surface inside a single prediction result.

use std::io;

use thiserror::Error;

/// The main error type for spam classifier operations.
#[derive(Error, Debug)]
pub enum SpamError {
    /// I/O errors (dataset or artifact files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV parsing errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset is unusable (empty, a class too small to split, ...).
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// A required dataset column is absent from the header row.
    #[error("Dataset error: missing required column '{0}'")]
    MissingColumn(String),

    /// A label other than `spam` or `ham`.
    #[error("Dataset error: invalid label '{value}' on row {row}")]
    InvalidLabel { row: usize, value: String },

    /// Artifact is missing, corrupt, or from an incompatible format version.
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Model and vectorizer artifacts do not belong to the same training run.
    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    /// Vectorizer fit or transform failure.
    #[error("Vectorizer error: {0}")]
    Vectorizer(String),

    /// Classifier fit failure.
    #[error("Training error: {0}")]
    Training(String),

    /// Evaluation could not be computed.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// A message rejected before vectorization.
    #[error("{0}")]
    Input(String),
}

impl SpamError {
    /// Create a dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        SpamError::Dataset(msg.into())
    }

    /// Create an artifact error.
    pub fn artifact<S: Into<String>>(msg: S) -> Self {
        SpamError::Artifact(msg.into())
    }

    /// Create a vectorizer error.
    pub fn vectorizer<S: Into<String>>(msg: S) -> Self {
        SpamError::Vectorizer(msg.into())
    }

    /// Create a training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        SpamError::Training(msg.into())
    }
}

/// Result type alias for spam classifier operations.
pub type Result<T> = std::result::Result<T, SpamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_missing_column() {
        let err = SpamError::MissingColumn("labels".into());
        assert_eq!(
            err.to_string(),
            "Dataset error: missing required column 'labels'"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: SpamError = io_err.into();
        assert!(matches!(err, SpamError::Io(_)));
    }
}
