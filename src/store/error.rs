//! Error types for candidate loading and NameStore construction

use thiserror::Error;

/// Errors raised while fetching candidates or building a NameStore.
///
/// The type is `Clone` because a single in-flight load hands the same
/// failure to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Candidate data is malformed (empty name, unparsable records)
    #[error("Invalid candidate data: {message}")]
    Config {
        /// What was wrong with the data
        message: String,
    },

    /// The external data source could not be read
    #[error("Candidate source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        /// Human readable name of the source (path or URL)
        source_name: String,
        /// Underlying failure
        message: String,
    },
}

impl StoreError {
    pub fn config(message: impl Into<String>) -> Self {
        StoreError::Config {
            message: message.into(),
        }
    }

    pub fn unavailable(source_name: impl Into<String>, message: impl ToString) -> Self {
        StoreError::SourceUnavailable {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Short machine-readable tag, used in tool outputs
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Config { .. } => "config_error",
            StoreError::SourceUnavailable { .. } => "source_unavailable",
        }
    }
}
