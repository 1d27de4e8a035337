//! Filter engine.
//!
//! All predicates combine with logical AND. Each predicate is "always true"
//! when its criterion is unset or equals [`ALL`]. Absent item fields never
//! match an equality or substring predicate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use fleet_model::{Field, InventoryItem, ModelError};

/// Sentinel value meaning "do not filter on this field".
pub const ALL: &str = "all";

/// Group filter value matching items without a group.
pub const UNGROUPED: &str = "ungrouped";

// =============================================================================
// DERIVED FILTER
// =============================================================================

/// Filters that originate from navigation parameters rather than UI controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedFilter {
    /// Any counter above zero.
    NeedsUpdates,
    /// Flagged stale by the backend.
    Stale,
    /// All counters zero and not stale.
    UpToDate,
}

impl DerivedFilter {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::NeedsUpdates => "needs-updates",
            Self::Stale => "stale",
            Self::UpToDate => "up-to-date",
        }
    }

    pub fn matches(&self, item: &InventoryItem) -> bool {
        match self {
            Self::NeedsUpdates => item.has_pending_counters(),
            Self::Stale => item.stale,
            Self::UpToDate => !item.has_pending_counters() && !item.stale,
        }
    }
}

impl fmt::Display for DerivedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for DerivedFilter {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "needs-updates" | "outdated" => Ok(Self::NeedsUpdates),
            "stale" => Ok(Self::Stale),
            "up-to-date" | "uptodate" => Ok(Self::UpToDate),
            _ => Err(ModelError::keyword("filter keyword", s)),
        }
    }
}

// =============================================================================
// FILTER CRITERIA
// =============================================================================

/// Search term, per-field filters and an optional derived filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub field_filters: BTreeMap<Field, String>,
    pub derived: Option<DerivedFilter>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set_field(field, value);
        self
    }

    #[must_use]
    pub fn with_derived(mut self, derived: DerivedFilter) -> Self {
        self.derived = Some(derived);
        self
    }

    /// Set a field filter. Setting [`ALL`] removes the filter.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        if is_all(&value) {
            self.field_filters.remove(&field);
        } else {
            self.field_filters.insert(field, value);
        }
    }

    pub fn field(&self, field: &Field) -> Option<&str> {
        self.field_filters.get(field).map(String::as_str)
    }

    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.search_term.trim().is_empty()
            && self.field_filters.values().all(|v| is_all(v))
            && self.derived.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, item: &InventoryItem) -> bool {
        Matcher::new(self).matches(item)
    }
}

fn is_all(value: &str) -> bool {
    value.eq_ignore_ascii_case(ALL)
}

/// Criteria with the search needle lowercased once per filter pass.
struct Matcher<'c> {
    needle: Option<String>,
    criteria: &'c FilterCriteria,
}

impl<'c> Matcher<'c> {
    fn new(criteria: &'c FilterCriteria) -> Self {
        let term = criteria.search_term.trim();
        let needle = (!term.is_empty()).then(|| term.to_lowercase());
        Self { needle, criteria }
    }

    fn matches(&self, item: &InventoryItem) -> bool {
        self.matches_search(item)
            && self
                .criteria
                .field_filters
                .iter()
                .all(|(field, value)| matches_field(item, field, value))
            && self.criteria.derived.is_none_or(|d| d.matches(item))
    }

    fn matches_search(&self, item: &InventoryItem) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        Field::SEARCHABLE.iter().any(|field| {
            item.text(field)
                .is_some_and(|value| value.to_lowercase().contains(needle.as_str()))
        })
    }
}

fn matches_field(item: &InventoryItem, field: &Field, value: &str) -> bool {
    if is_all(value) {
        return true;
    }
    match field {
        Field::Group => {
            let value = value.trim();
            if value.eq_ignore_ascii_case(UNGROUPED) {
                item.group.is_none()
            } else {
                item.group_id().is_some_and(|id| id.as_str() == value)
            }
        }
        Field::Counter(name) => match (value.trim().parse::<u64>(), item.counter(name)) {
            (Ok(expected), Some(actual)) => expected == actual,
            _ => false,
        },
        Field::LastSeen => false,
        _ => item
            .text(field)
            .is_some_and(|actual| actual.eq_ignore_ascii_case(value.trim())),
    }
}

/// Keep the items matching every active predicate, in encounter order.
pub fn filter<'a, I>(items: I, criteria: &FilterCriteria) -> Vec<&'a InventoryItem>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    let matcher = Matcher::new(criteria);
    items.into_iter().filter(|item| matcher.matches(item)).collect()
}
