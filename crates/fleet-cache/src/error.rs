//! Error types for backend calls and mutations.

use fleet_model::ItemId;
use thiserror::Error;

/// Errors reported by an [`InventoryApi`](crate::InventoryApi) backend.
///
/// `Clone` so a failed mutation can keep its error in
/// [`MutationState::Error`](crate::MutationState::Error) while the caller
/// receives its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Transport failure; the request may not have reached the server.
    #[error("network error: {0}")]
    Network(String),

    /// The addressed entity does not exist.
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// The server refused the payload.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The server accepted the request but declined to apply it.
    #[error("{operation} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    /// The same mutation is still in flight; nothing was sent.
    #[error("mutation already pending")]
    AlreadyPending,

    /// The owning view was torn down before the result arrived.
    #[error("view scope cancelled")]
    Cancelled,
}

impl ApiError {
    /// Returns a user-friendly message suitable for a toast or status line.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) => "Could not reach the server. Please check your connection.",
            Self::NotFound(_) => "The item no longer exists. It may have been deleted.",
            Self::Validation(_) => "The server rejected the change. Please review your input.",
            Self::Rejected { .. } => "The change could not be applied.",
            Self::AlreadyPending => "A previous change is still being applied.",
            Self::Cancelled => "The view was closed before the change completed.",
        }
    }

    /// Whether retrying the same request could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type alias for backend and reconciler operations.
pub type Result<T> = std::result::Result<T, ApiError>;
