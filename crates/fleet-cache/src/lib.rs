//! Server state for the fleet dashboard.
//!
//! - [`InventoryApi`]: the backend contract, with [`MemoryApi`] as an
//!   in-process implementation
//! - [`QueryCache`]: key-addressed cache with staleness windows and
//!   stale-while-revalidate reads
//! - [`Reconciler`]: pessimistic mutations that update the cache only after
//!   the server confirmed them
//! - [`Mutation`] and [`ViewScope`]: per-mutation state and teardown
//!   cancellation

mod api;
mod cache;
mod error;
mod key;
mod mutation;
mod reconcile;
mod scope;

pub use api::{InventoryApi, MemoryApi};
pub use cache::{CacheStats, Collection, Freshness, QueryCache};
pub use error::{ApiError, Result};
pub use key::{CacheConfig, QueryKey, QueryKind};
pub use mutation::{Mutation, MutationState};
pub use reconcile::Reconciler;
pub use scope::ViewScope;
