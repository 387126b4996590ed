//! Resolution error handling
//!
//! Missing references and missing locale variants never show up here: they
//! degrade to absent fields. What remains are failures the caller has to
//! deal with (a broken payload, a failing media hook, an unreachable source).

use thiserror::Error;

/// Errors that can occur while fetching and resolving a query
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The media transform hook rejected an asset (single-locale queries only)
    #[error("Media transform failed for asset '{id}': {source}")]
    MediaTransform {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    /// An asset is missing a usable `file` descriptor
    #[error("Asset '{id}' is malformed: {details}")]
    MalformedAsset { id: String, details: String },

    /// Payload JSON does not have the expected record shape
    #[error("Invalid payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// A single-record lookup came back empty
    #[error("Record not found: '{id}'")]
    NotFound { id: String },

    /// The content source failed to deliver a payload
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl ResolveError {
    /// Create a malformed-asset error
    pub fn malformed_asset(id: impl Into<String>, details: impl ToString) -> Self {
        ResolveError::MalformedAsset {
            id: id.into(),
            details: details.to_string(),
        }
    }

    /// Check if retrying the same query could succeed
    ///
    /// True only for source failures the source marked as [`TransientError`]
    /// (timeouts, rate limiting, server errors). Rejected credentials, unknown
    /// spaces and undecodable responses fail the same way again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ResolveError::Source(err) => err.downcast_ref::<TransientError>().is_some(),
            _ => false,
        }
    }
}

/// A content source failure that may succeed when retried
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransientError {
    message: String,
}

impl TransientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;
