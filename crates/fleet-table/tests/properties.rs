//! Property and scenario tests for the table engines.

use fleet_model::{Field, GroupId, GroupRef, InventoryItem, ItemId};
use fleet_table::{
    FilterCriteria, GroupDimension, SortDirection, SortState, UNGROUPED, filter, group, sort,
};
use proptest::prelude::*;

fn group_ref(id: &str) -> GroupRef {
    GroupRef::new(GroupId::new(id).unwrap(), id, "#888888")
}

fn ids(items: &[&InventoryItem]) -> Vec<u64> {
    items.iter().map(|i| i.id.get()).collect()
}

fn arb_item() -> impl Strategy<Value = InventoryItem> {
    (
        any::<u64>(),
        proptest::option::of("[a-zA-Z]{0,6}"),
        proptest::option::of("10\\.0\\.[0-9]\\.[0-9]"),
        proptest::option::of(prop_oneof!["G1", "G2", "G3"]),
        proptest::option::of(0u64..5),
    )
        .prop_map(|(id, name, address, group, outdated)| {
            let mut item = InventoryItem::new(id);
            item.name = name;
            item.address = address;
            item.group = group.map(|g| group_ref(&g));
            if let Some(n) = outdated {
                item.counters.insert("outdated".to_string(), n);
            }
            item
        })
}

fn arb_group_filter() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("all".to_string()),
        Just(UNGROUPED.to_string()),
        Just("G1".to_string()),
        Just("G2".to_string()),
    ]
}

proptest! {
    #[test]
    fn filter_composition_is_order_independent(
        items in proptest::collection::vec(arb_item(), 0..30),
        term in "[a-z]{0,2}",
        group_value in arb_group_filter(),
    ) {
        let combined = FilterCriteria::new()
            .with_search(term.clone())
            .with_field(Field::Group, group_value.clone());
        let by_group = FilterCriteria::new().with_field(Field::Group, group_value);
        let by_search = FilterCriteria::new().with_search(term);

        let at_once = filter(&items, &combined);
        let staged = filter(filter(&items, &by_group), &by_search);
        let reversed = filter(filter(&items, &by_search), &by_group);

        prop_assert_eq!(ids(&at_once), ids(&staged));
        prop_assert_eq!(ids(&at_once), ids(&reversed));
    }

    #[test]
    fn missing_values_always_trail(
        items in proptest::collection::vec(arb_item(), 0..30),
        descending in any::<bool>(),
    ) {
        let direction = if descending { SortDirection::Desc } else { SortDirection::Asc };
        let sorted = sort(&items, &SortState::new(Field::Name, direction));
        let first_missing = sorted.iter().position(|i| i.name.is_none()).unwrap_or(sorted.len());
        prop_assert!(sorted[first_missing..].iter().all(|i| i.name.is_none()));
    }

    #[test]
    fn resorting_is_deterministic(
        items in proptest::collection::vec(arb_item(), 0..30),
        rounds in 1usize..5,
    ) {
        let state = SortState::desc(Field::counter("outdated"));
        let first = ids(&sort(&items, &state));
        let mut current = sort(&items, &state);
        for _ in 0..rounds {
            current = sort(current, &state);
        }
        prop_assert_eq!(first, ids(&current));
    }

    #[test]
    fn grouping_preserves_every_row(items in proptest::collection::vec(arb_item(), 0..30)) {
        let buckets = group(&items, GroupDimension::Group);
        let total: usize = buckets.iter().map(|b| b.len()).sum();
        prop_assert_eq!(total, items.len());
    }
}

#[test]
fn scenario_a_ungrouped_filter() {
    let items = vec![
        InventoryItem::new(1u64).with_name("a"),
        InventoryItem::new(2u64).with_name("b").with_group(group_ref("G1")),
    ];
    let criteria = FilterCriteria::new().with_field(Field::Group, UNGROUPED);
    assert_eq!(ids(&filter(&items, &criteria)), [1]);
}

#[test]
fn scenario_b_missing_name_sorts_last() {
    let items = vec![InventoryItem::new(1u64).with_name("b"), InventoryItem::new(2u64)];
    let sorted = sort(&items, &SortState::asc(Field::Name));
    assert_eq!(ids(&sorted), [1, 2]);
}

#[test]
fn scenario_e_status_grouping() {
    let items = vec![
        InventoryItem::new(1u64).with_status("active"),
        InventoryItem::new(2u64).with_status("active"),
        InventoryItem::new(3u64).with_status("inactive"),
    ];
    let buckets = group(&items, GroupDimension::Status);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].label, "Active");
    assert_eq!(buckets[0].ids(), [ItemId(1), ItemId(2)]);
    assert_eq!(buckets[1].label, "Inactive");
    assert_eq!(buckets[1].ids(), [ItemId(3)]);
}
