//! Inventory records as returned by the backend list and detail endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::ids::{GroupId, ItemId};

/// Counter holding the number of outdated packages on a host or repository.
pub const COUNTER_OUTDATED: &str = "outdated";

/// Counter holding the number of outstanding security updates.
pub const COUNTER_SECURITY: &str = "security";

// =============================================================================
// GROUP REFERENCE
// =============================================================================

/// Group an item is assigned to. Referenced, never owned, by an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: GroupId,
    pub name: String,
    /// Display color, e.g. `#3b82f6`.
    #[serde(default)]
    pub color: String,
}

impl GroupRef {
    pub fn new(id: GroupId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
        }
    }
}

// =============================================================================
// INVENTORY ITEM
// =============================================================================

/// A host, repository or package row.
///
/// Every display field is nullable: the backend omits what it does not know,
/// and the table engine treats absence as a normal condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub os: Option<String>,
    pub status: Option<String>,
    pub group: Option<GroupRef>,
    /// Named numeric counters (outdated updates, security updates, ...).
    #[serde(default)]
    pub counters: BTreeMap<String, u64>,
    /// Last check-in / sync time.
    pub last_seen: Option<DateTime<Utc>>,
    /// Set by the backend when the item has not reported within its window.
    #[serde(default)]
    pub stale: bool,
    /// Named boolean attributes (e.g. `enabled`, `security_only`).
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    pub notes: Option<String>,
}

impl InventoryItem {
    /// Create an item with only an identifier.
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            address: None,
            category: None,
            os: None,
            status: None,
            group: None,
            counters: BTreeMap::new(),
            last_seen: None,
            stale: false,
            flags: BTreeMap::new(),
            notes: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: GroupRef) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn with_counter(mut self, name: impl Into<String>, value: u64) -> Self {
        self.counters.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_last_seen(mut self, at: DateTime<Utc>) -> Self {
        self.last_seen = Some(at);
        self
    }

    #[must_use]
    pub fn with_stale(mut self, stale: bool) -> Self {
        self.stale = stale;
        self
    }

    #[must_use]
    pub fn with_flag(mut self, flag: impl Into<String>, value: bool) -> Self {
        self.flags.insert(flag.into(), value);
        self
    }

    pub fn group_id(&self) -> Option<&GroupId> {
        self.group.as_ref().map(|g| &g.id)
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    /// True when any counter is non-zero.
    pub fn has_pending_counters(&self) -> bool {
        self.counters.values().any(|&v| v > 0)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    /// Textual value of a field, if the field is textual and present.
    ///
    /// `Group` resolves to the group's display name.
    pub fn text(&self, field: &Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Address => self.address.as_deref(),
            Field::Category => self.category.as_deref(),
            Field::Os => self.os.as_deref(),
            Field::Status => self.status.as_deref(),
            Field::Group => self.group.as_ref().map(|g| g.name.as_str()),
            Field::LastSeen | Field::Counter(_) => None,
        }
    }
}

// =============================================================================
// DETAIL
// =============================================================================

/// One applied update in an item's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub package: String,
    pub from_version: Option<String>,
    pub to_version: String,
    pub applied_at: DateTime<Utc>,
}

/// Host on which a package is installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSummary {
    pub id: ItemId,
    pub name: Option<String>,
    pub installed_version: Option<String>,
}

/// Get-by-id payload. The relation collections feed detail views only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub item: InventoryItem,
    #[serde(default)]
    pub history: Vec<UpdateRecord>,
    #[serde(default)]
    pub installed_on: Vec<HostSummary>,
}

impl ItemDetail {
    pub fn new(item: InventoryItem) -> Self {
        Self {
            item,
            history: Vec::new(),
            installed_on: Vec::new(),
        }
    }
}
