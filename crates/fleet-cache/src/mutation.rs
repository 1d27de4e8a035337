//! Per-mutation state machine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ApiError, Result};

/// Lifecycle of one mutation: `Idle -> Pending -> {Success, Error}`.
///
/// A finished mutation may be started again, which moves it back to
/// `Pending`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MutationState<T> {
    #[default]
    Idle,
    Pending,
    Success(T),
    Error(ApiError),
}

impl<T> MutationState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
        }
    }
}

/// Shared handle to a mutation's state.
///
/// The view keeps one per user action and renders from [`state`](Self::state)
/// (spinner while pending, error banner on failure).
#[derive(Debug)]
pub struct Mutation<T> {
    state: Arc<Mutex<MutationState<T>>>,
}

impl<T> Clone for Mutation<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for Mutation<T> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MutationState::Idle)),
        }
    }
}

impl<T: Clone> Mutation<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutationState<T> {
        self.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_pending()
    }

    /// Move to `Pending`. Fails when the mutation is already running.
    pub fn begin(&self) -> Result<()> {
        let mut state = self.lock();
        if state.is_pending() {
            return Err(ApiError::AlreadyPending);
        }
        *state = MutationState::Pending;
        Ok(())
    }

    /// Record the outcome of a pending mutation.
    pub fn finish(&self, outcome: &Result<T>) {
        let mut state = self.lock();
        if !state.is_pending() {
            tracing::debug!(state = state.label(), "ignoring outcome of a mutation not pending");
            return;
        }
        *state = match outcome {
            Ok(value) => MutationState::Success(value.clone()),
            Err(error) => MutationState::Error(error.clone()),
        };
    }

    /// Back to `Idle`, e.g. when an error banner is dismissed.
    pub fn reset(&self) {
        *self.lock() = MutationState::Idle;
    }

    fn lock(&self) -> MutexGuard<'_, MutationState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mutation: Mutation<u32> = Mutation::new();
        assert_eq!(mutation.state(), MutationState::Idle);

        mutation.begin().unwrap();
        assert!(mutation.is_pending());
        assert_eq!(mutation.begin(), Err(ApiError::AlreadyPending));
        assert!(mutation.is_pending());

        mutation.finish(&Ok(7));
        assert_eq!(mutation.state(), MutationState::Success(7));

        mutation.begin().unwrap();
        mutation.finish(&Err(ApiError::Network("down".into())));
        assert_eq!(mutation.state().label(), "error");

        mutation.reset();
        assert_eq!(mutation.state(), MutationState::Idle);
    }

    #[test]
    fn outcome_without_begin_is_ignored() {
        let mutation: Mutation<u32> = Mutation::new();
        mutation.finish(&Ok(1));
        assert_eq!(mutation.state(), MutationState::Idle);
    }
}
