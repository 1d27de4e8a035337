//! Dashboard error type.

use std::path::PathBuf;

use fleet_cache::ApiError;
use fleet_persistence::StoreError;
use thiserror::Error;

/// Errors surfaced by table views and dashboard configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    // =========================================================================
    // CONFIGURATION
    // =========================================================================
    /// Settings file could not be written.
    #[error("failed to save settings to {path}: {reason}")]
    ConfigSave { path: PathBuf, reason: String },

    // =========================================================================
    // SERVER STATE
    // =========================================================================
    /// Backend call or mutation failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    // =========================================================================
    // LOCAL STATE
    // =========================================================================
    /// Column layout could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An action needed a notes draft but none is open.
    #[error("no notes draft is open")]
    NoDraft,
}

impl DashboardError {
    /// Returns a user-friendly message for a toast or status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigSave { .. } => "Your settings could not be saved.".to_string(),
            Self::Api(error) => error.user_message().to_string(),
            Self::Store(error) => error.user_message(),
            Self::NoDraft => "Open an item's notes before saving.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
