//! Composition of the engines: filter, then sort, then group, then paginate.

use fleet_model::{Field, InventoryItem};

use crate::filter::{FilterCriteria, filter};
use crate::group::{GroupDimension, group};
use crate::paginate::{Page, Pagination, paginate};
use crate::sort::{SortState, sort};

/// The query-shaped axes of a table view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    pub criteria: FilterCriteria,
    /// `None` keeps server order.
    pub sort: Option<SortState>,
    pub grouping: GroupDimension,
    pub pagination: Pagination,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the pipeline over a collection.
    pub fn apply<'a, I>(&self, items: I) -> Page<'a>
    where
        I: IntoIterator<Item = &'a InventoryItem>,
    {
        let filtered = filter(items, &self.criteria);
        let ordered = match &self.sort {
            Some(state) => sort(filtered, state),
            None => filtered,
        };
        let page = paginate(group(ordered, self.grouping), self.pagination);
        tracing::trace!(
            rows = page.total_rows,
            page = page.page,
            buckets = page.buckets.len(),
            "table pipeline applied"
        );
        page
    }
}

/// Text of a table cell for a column id. Unknown columns render empty.
pub fn cell_text(item: &InventoryItem, column_id: &str) -> String {
    if column_id == "id" {
        return item.id.to_string();
    }
    let Ok(field) = column_id.parse::<Field>() else {
        return String::new();
    };
    match &field {
        Field::Counter(name) => item.counter(name).map(|v| v.to_string()),
        Field::LastSeen => item
            .last_seen
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
        _ => item.text(&field).map(str::to_string),
    }
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DerivedFilter;
    use crate::group::ALL_LABEL;

    #[test]
    fn default_query_keeps_server_order() {
        let items = vec![
            InventoryItem::new(3u64).with_name("c"),
            InventoryItem::new(1u64).with_name("a"),
        ];
        let page = TableQuery::new().apply(&items);
        assert_eq!(page.buckets[0].label, ALL_LABEL);
        let ids: Vec<u64> = page.rows().map(|i| i.id.get()).collect();
        assert_eq!(ids, [3, 1]);
    }

    #[test]
    fn full_pipeline() {
        let items = vec![
            InventoryItem::new(1u64).with_name("b").with_status("active").with_counter("outdated", 1),
            InventoryItem::new(2u64).with_name("a").with_status("inactive").with_counter("outdated", 4),
            InventoryItem::new(3u64).with_name("c").with_status("active"),
            InventoryItem::new(4u64).with_name("d").with_status("active").with_counter("outdated", 2),
        ];
        let query = TableQuery {
            criteria: FilterCriteria::new().with_derived(DerivedFilter::NeedsUpdates),
            sort: Some(SortState::asc(Field::Name)),
            grouping: GroupDimension::Status,
            pagination: Pagination::new(0, 10),
        };
        let page = query.apply(&items);
        let labels: Vec<&str> = page.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["Inactive", "Active"]);
        let ids: Vec<u64> = page.rows().map(|i| i.id.get()).collect();
        assert_eq!(ids, [2, 1, 4]);
    }

    #[test]
    fn cells_render_missing_as_empty() {
        let item = InventoryItem::new(9u64).with_counter("outdated", 5);
        assert_eq!(cell_text(&item, "id"), "9");
        assert_eq!(cell_text(&item, "outdated"), "5");
        assert_eq!(cell_text(&item, "name"), "");
        assert_eq!(cell_text(&item, "actions!"), "");
    }
}
