//! Query keys and per-kind staleness windows.

use std::fmt;
use std::time::Duration;

use fleet_model::{ItemId, ViewKind};

/// Address of one cached query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Full collection of a view.
    Collection(ViewKind),
    /// Get-by-id payload.
    Detail(ItemId),
    /// Group catalog.
    Groups,
}

impl QueryKey {
    pub fn kind(&self) -> QueryKind {
        match self {
            Self::Collection(_) => QueryKind::Collection,
            Self::Detail(_) => QueryKind::Detail,
            Self::Groups => QueryKind::Groups,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection(view) => write!(f, "{view}"),
            Self::Detail(id) => write!(f, "detail/{id}"),
            Self::Groups => f.write_str("groups"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Collection,
    Detail,
    Groups,
}

/// Staleness windows. Within its window a cached value is served without
/// contacting the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub collection_stale_time: Duration,
    pub detail_stale_time: Duration,
    pub groups_stale_time: Duration,
}

impl CacheConfig {
    /// Same window for every kind.
    pub fn uniform(stale_time: Duration) -> Self {
        Self {
            collection_stale_time: stale_time,
            detail_stale_time: stale_time,
            groups_stale_time: stale_time,
        }
    }

    pub fn stale_time(&self, kind: QueryKind) -> Duration {
        match kind {
            QueryKind::Collection => self.collection_stale_time,
            QueryKind::Detail => self.detail_stale_time,
            QueryKind::Groups => self.groups_stale_time,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            collection_stale_time: Duration::from_secs(30),
            detail_stale_time: Duration::from_secs(60),
            groups_stale_time: Duration::from_secs(300),
        }
    }
}
