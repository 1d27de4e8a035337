//! Grouping engine: splits an ordered collection into labelled buckets.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use fleet_model::{InventoryItem, ItemId, ModelError};

/// Label of the implicit bucket when grouping is off.
pub const ALL_LABEL: &str = "All";

/// Label for items without a group.
pub const UNGROUPED_LABEL: &str = "Ungrouped";

/// Label for items without a status or OS.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GroupDimension {
    #[default]
    None,
    Group,
    Status,
    Os,
}

impl GroupDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Group => "group",
            Self::Status => "status",
            Self::Os => "os",
        }
    }

    pub fn is_active(&self) -> bool {
        *self != Self::None
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupDimension {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "group" => Ok(Self::Group),
            "status" => Ok(Self::Status),
            "os" => Ok(Self::Os),
            _ => Err(ModelError::keyword("group dimension", s)),
        }
    }
}

/// A named run of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket<'a> {
    /// Identity of the bucket. Distinct groups sharing a display name get
    /// distinct keys.
    pub key: String,
    pub label: String,
    pub items: Vec<&'a InventoryItem>,
}

impl<'a> Bucket<'a> {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::keyed(label.clone(), label)
    }

    pub fn keyed(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }
}

/// Bucket label for one item.
pub fn bucket_label(item: &InventoryItem, dimension: GroupDimension) -> String {
    match dimension {
        GroupDimension::None => ALL_LABEL.to_string(),
        GroupDimension::Group => item
            .group
            .as_ref()
            .map_or_else(|| UNGROUPED_LABEL.to_string(), |g| g.name.clone()),
        GroupDimension::Status => non_blank(item.status.as_deref())
            .map_or_else(|| UNKNOWN_LABEL.to_string(), capitalize),
        GroupDimension::Os => non_blank(item.os.as_deref())
            .map_or_else(|| UNKNOWN_LABEL.to_string(), str::to_string),
    }
}

/// Bucket key for one item: the group id when grouping by group (empty for
/// ungrouped items), otherwise the label.
pub fn bucket_key(item: &InventoryItem, dimension: GroupDimension) -> String {
    match dimension {
        GroupDimension::Group => item
            .group_id()
            .map_or_else(String::new, |id| id.as_str().to_string()),
        _ => bucket_label(item, dimension),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Group already-ordered items, creating buckets in first-seen order.
///
/// With [`GroupDimension::None`] the result is always exactly one bucket,
/// even when empty.
pub fn group<'a, I>(items: I, dimension: GroupDimension) -> Vec<Bucket<'a>>
where
    I: IntoIterator<Item = &'a InventoryItem>,
{
    if !dimension.is_active() {
        let mut bucket = Bucket::new(ALL_LABEL);
        bucket.items.extend(items);
        return vec![bucket];
    }

    let mut buckets: Vec<Bucket<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in items {
        let slot = *index.entry(bucket_key(item, dimension)).or_insert_with_key(|key| {
            buckets.push(Bucket::keyed(key.clone(), bucket_label(item, dimension)));
            buckets.len() - 1
        });
        buckets[slot].items.push(item);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_model::{GroupId, GroupRef};

    fn summary(buckets: &[Bucket<'_>]) -> Vec<(String, Vec<u64>)> {
        buckets
            .iter()
            .map(|b| (b.label.clone(), b.ids().into_iter().map(ItemId::get).collect()))
            .collect()
    }

    #[test]
    fn status_buckets_capitalized_in_first_seen_order() {
        let items = vec![
            InventoryItem::new(1u64).with_status("active"),
            InventoryItem::new(2u64).with_status("active"),
            InventoryItem::new(3u64).with_status("inactive"),
        ];
        assert_eq!(
            summary(&group(&items, GroupDimension::Status)),
            vec![
                ("Active".to_string(), vec![1, 2]),
                ("Inactive".to_string(), vec![3]),
            ]
        );
    }

    #[test]
    fn no_dimension_is_single_bucket() {
        let items = vec![InventoryItem::new(1u64), InventoryItem::new(2u64)];
        let buckets = group(&items, GroupDimension::None);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, ALL_LABEL);
        assert_eq!(buckets[0].len(), 2);

        let empty: Vec<InventoryItem> = Vec::new();
        assert_eq!(group(&empty, GroupDimension::None).len(), 1);
        assert!(group(&empty, GroupDimension::Os).is_empty());
    }

    #[test]
    fn missing_values_use_fallback_labels() {
        let web = GroupRef::new(GroupId::new("G1").unwrap(), "Web", "#000");
        let items = vec![
            InventoryItem::new(1u64),
            InventoryItem::new(2u64).with_group(web),
            InventoryItem::new(3u64).with_os("  "),
        ];
        let by_group = group(&items, GroupDimension::Group);
        assert_eq!(
            summary(&by_group),
            vec![
                (UNGROUPED_LABEL.to_string(), vec![1, 3]),
                ("Web".to_string(), vec![2]),
            ]
        );
        let by_os = group(&items, GroupDimension::Os);
        assert_eq!(summary(&by_os), vec![(UNKNOWN_LABEL.to_string(), vec![1, 2, 3])]);
    }

    #[test]
    fn groups_sharing_a_name_stay_apart() {
        let web = |id: &str| GroupRef::new(GroupId::new(id).unwrap(), "Web", "#000");
        let items = vec![
            InventoryItem::new(1u64).with_group(web("g1")),
            InventoryItem::new(2u64).with_group(web("g2")),
            InventoryItem::new(3u64).with_group(web("g1")),
        ];
        let buckets = group(&items, GroupDimension::Group);
        assert_eq!(
            summary(&buckets),
            vec![("Web".to_string(), vec![1, 3]), ("Web".to_string(), vec![2])]
        );
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["g1", "g2"]);
    }
}
