//! Error types.
//!
//! Provider errors are defined here rather than in `quizprep-providers` so the
//! quiz pipeline can downcast and classify them for retry decisions without
//! string matching.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (missing or invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The API answered, but not in the expected shape.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// A user action rejected before anything was written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("note title is required")]
    MissingTitle,

    #[error("note content is required")]
    MissingContent,

    #[error("note title '{title}' clashes with existing note '{existing}'")]
    TitleConflict { title: String, existing: String },

    #[error("question index {index} is out of range (quiz has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("score {score} is out of range (expected 0-5)")]
    ScoreOutOfRange { score: u8 },

    #[error("question count {count} is out of range (expected {min}-{max})")]
    QuestionCountOutOfRange { count: usize, min: usize, max: usize },
}

/// Record store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Document import failures.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0} (supported: pdf, txt)")]
    UnsupportedType(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pdftotext is not available: {0}")]
    ToolMissing(String),

    #[error("pdftotext failed on {path}: {stderr}")]
    ToolFailed { path: PathBuf, stderr: String },

    #[error("text extraction timed out after {0}s")]
    Timeout(u64),

    #[error("no text could be extracted from {0}")]
    Empty(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_errors() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ProviderError::ModelNotFound("x".into()).is_permanent());
        assert!(!ProviderError::Timeout(30).is_permanent());
        assert!(!ProviderError::NetworkError("reset".into()).is_permanent());
    }

    #[test]
    fn retry_after_only_for_rate_limits() {
        let err = ProviderError::RateLimited {
            retry_after_ms: 5000,
        };
        assert_eq!(err.retry_after_ms(), Some(5000));
        assert_eq!(ProviderError::Timeout(1).retry_after_ms(), None);
    }

    #[test]
    fn validation_messages() {
        let err = ValidationError::QuestionCountOutOfRange {
            count: 12,
            min: 3,
            max: 10,
        };
        assert_eq!(err.to_string(), "question count 12 is out of range (expected 3-10)");
    }
}
