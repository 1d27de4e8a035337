//! Field and view names shared by filters, sorting, grouping and column layouts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

// =============================================================================
// FIELD
// =============================================================================

/// An addressable attribute of an [`InventoryItem`](crate::InventoryItem).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Address,
    Category,
    Os,
    Status,
    Group,
    LastSeen,
    /// A named numeric counter, e.g. `outdated`.
    Counter(String),
}

impl Field {
    /// Fields matched by the free-text search box.
    pub const SEARCHABLE: [Field; 3] = [Field::Name, Field::Address, Field::Category];

    pub fn counter(name: impl Into<String>) -> Self {
        Self::Counter(name.into())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Counter(_))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Address => f.write_str("address"),
            Self::Category => f.write_str("category"),
            Self::Os => f.write_str("os"),
            Self::Status => f.write_str("status"),
            Self::Group => f.write_str("group"),
            Self::LastSeen => f.write_str("last_seen"),
            Self::Counter(name) => f.write_str(name),
        }
    }
}

impl FromStr for Field {
    type Err = ModelError;

    /// Parses a field key. Names that are not a fixed attribute are read as
    /// counters when they look like identifiers (`outdated`, `security`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let field = match key.as_str() {
            "name" => Self::Name,
            "address" => Self::Address,
            "category" => Self::Category,
            "os" => Self::Os,
            "status" => Self::Status,
            "group" => Self::Group,
            "last_seen" => Self::LastSeen,
            _ if is_counter_key(&key) => Self::Counter(key),
            _ => return Err(ModelError::UnknownField(s.to_string())),
        };
        Ok(field)
    }
}

fn is_counter_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && key.starts_with(|c: char| c.is_ascii_lowercase())
}

impl Serialize for Field {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// VIEW KIND
// =============================================================================

/// The dashboard views that embed an inventory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    Hosts,
    Repositories,
    PackageDetail,
    RepositoryDetail,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        Self::Hosts,
        Self::Repositories,
        Self::PackageDetail,
        Self::RepositoryDetail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hosts => "hosts",
            Self::Repositories => "repositories",
            Self::PackageDetail => "package-detail",
            Self::RepositoryDetail => "repository-detail",
        }
    }

    /// Display name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hosts => "Hosts",
            Self::Repositories => "Repositories",
            Self::PackageDetail => "Package Detail",
            Self::RepositoryDetail => "Repository Detail",
        }
    }

    /// Storage key of the view's persisted column layout.
    pub fn column_config_key(&self) -> String {
        format!("{}-column-config", self.as_str())
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownView(s.to_string()))
    }
}
