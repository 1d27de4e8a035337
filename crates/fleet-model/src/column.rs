use serde::{Deserialize, Serialize};

/// One column of an inventory table: label, visibility and position.
///
/// Across a full descriptor set, `order` is a dense permutation of `0..N`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: String,
    pub label: String,
    pub visible: bool,
    pub order: usize,
}

impl ColumnDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, order: usize) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            visible: true,
            order,
        }
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Visible descriptors in render order.
pub fn visible_columns(columns: &[ColumnDescriptor]) -> Vec<&ColumnDescriptor> {
    let mut visible: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.visible).collect();
    visible.sort_by_key(|c| c.order);
    visible
}

/// True when the `order` values form a dense permutation of `0..len`.
pub fn is_dense_order(columns: &[ColumnDescriptor]) -> bool {
    let mut seen = vec![false; columns.len()];
    for column in columns {
        match seen.get_mut(column.order) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}
