use thiserror::Error;

/// Errors raised while parsing model values from user or navigation input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid item id: {0:?}")]
    InvalidItemId(String),
    #[error("invalid group id: {0:?}")]
    InvalidGroupId(String),
    #[error("unknown field: {0:?}")]
    UnknownField(String),
    #[error("unknown view: {0:?}")]
    UnknownView(String),
    #[error("unknown {kind}: {value:?}")]
    UnknownKeyword { kind: &'static str, value: String },
}

impl ModelError {
    pub fn keyword(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownKeyword {
            kind,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
