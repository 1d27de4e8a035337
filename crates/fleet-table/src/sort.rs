//! Sort engine.
//!
//! Comparators are chosen per field: text compares case-insensitively,
//! counters numerically, timestamps as instants. A missing value always sorts
//! after every present value, in both directions. The comparison therefore
//! yields a four-way [`KeyOrdering`] and only the present/present outcome is
//! subject to the requested direction.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use fleet_model::{Field, InventoryItem, ModelError};

// =============================================================================
// SORT STATE
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(ModelError::keyword("sort direction", s)),
        }
    }
}

/// The single active sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortState {
    pub field: Field,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self::asc(Field::Name)
    }
}

impl SortState {
    pub fn new(field: Field, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn asc(field: Field) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: Field) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    /// Header click: the same field flips direction, another field starts ascending.
    pub fn toggle(&mut self, field: Field) {
        if self.field == field {
            self.direction = self.direction.reversed();
        } else {
            *self = Self::asc(field);
        }
    }
}

// =============================================================================
// KEYS AND COMPARISON
// =============================================================================

/// Comparable projection of one field of one item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Text(String),
    Number(u64),
    Instant(DateTime<Utc>),
}

/// Which side of a comparison lacked a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSide {
    Left,
    Right,
    Both,
}

/// Outcome of comparing two optional keys before direction is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrdering {
    Less,
    Equal,
    Greater,
    Missing(MissingSide),
}

impl KeyOrdering {
    pub fn of(left: Option<&SortKey>, right: Option<&SortKey>) -> Self {
        match (left, right) {
            (Some(l), Some(r)) => match l.cmp(r) {
                Ordering::Less => Self::Less,
                Ordering::Equal => Self::Equal,
                Ordering::Greater => Self::Greater,
            },
            (None, Some(_)) => Self::Missing(MissingSide::Left),
            (Some(_), None) => Self::Missing(MissingSide::Right),
            (None, None) => Self::Missing(MissingSide::Both),
        }
    }

    /// Apply the direction to present values; missing always goes last.
    pub fn resolve(self, direction: SortDirection) -> Ordering {
        let present = match self {
            Self::Less => Ordering::Less,
            Self::Equal => Ordering::Equal,
            Self::Greater => Ordering::Greater,
            Self::Missing(MissingSide::Left) => return Ordering::Greater,
            Self::Missing(MissingSide::Right) => return Ordering::Less,
            Self::Missing(MissingSide::Both) => return Ordering::Equal,
        };
        match direction {
            SortDirection::Asc => present,
            SortDirection::Desc => present.reverse(),
        }
    }
}

/// Project an item onto the comparable key for `field`.
pub fn sort_key(item: &InventoryItem, field: &Field) -> Option<SortKey> {
    match field {
        Field::Counter(name) => item.counter(name).map(SortKey::Number),
        Field::LastSeen => item.last_seen.map(SortKey::Instant),
        _ => item.text(field).map(|s| SortKey::Text(s.to_lowercase())),
    }
}

pub fn compare_items(a: &InventoryItem, b: &InventoryItem, state: &SortState) -> Ordering {
    let left = sort_key(a, &state.field);
    let right = sort_key(b, &state.field);
    KeyOrdering::of(left.as_ref(), right.as_ref()).resolve(state.direction)
}

/// Return the items ordered by `state`. Ties keep encounter order.
pub fn sort<'a, I>(items: I, state: &SortState) -> Vec<&'a InventoryItem>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    let mut keyed: Vec<(Option<SortKey>, &'a InventoryItem)> = items
        .into_iter()
        .map(|item| (sort_key(item, &state.field), item))
        .collect();
    keyed.sort_by(|(l, _), (r, _)| KeyOrdering::of(l.as_ref(), r.as_ref()).resolve(state.direction));
    keyed.into_iter().map(|(_, item)| item).collect()
}
