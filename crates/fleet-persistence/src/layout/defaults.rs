//! Hard-coded default column sets and legacy id spellings per view.

use fleet_model::{ColumnDescriptor, ViewKind};

/// Schema version of the current column ids.
///
/// Version 1 used the snake_case backend field names as column ids. It is
/// never written anymore; its presence is inferred from [`LayoutSchema::legacy_ids`].
pub const CURRENT_LAYOUT_VERSION: u32 = 2;

/// Default columns and migration triggers of one view.
#[derive(Debug, Clone, Copy)]
pub struct LayoutSchema {
    pub view: ViewKind,
    columns: &'static [(&'static str, &'static str, bool)],
    pub legacy_ids: &'static [&'static str],
}

impl LayoutSchema {
    pub fn for_view(view: ViewKind) -> Self {
        match view {
            ViewKind::Hosts => HOSTS,
            ViewKind::Repositories => REPOSITORIES,
            ViewKind::PackageDetail => PACKAGE_DETAIL,
            ViewKind::RepositoryDetail => REPOSITORY_DETAIL,
        }
    }

    /// Fresh copy of the default descriptors.
    pub fn defaults(&self) -> Vec<ColumnDescriptor> {
        self.columns
            .iter()
            .enumerate()
            .map(|(order, &(id, label, visible))| {
                let column = ColumnDescriptor::new(id, label, order);
                if visible { column } else { column.hidden() }
            })
            .collect()
    }

    pub fn is_legacy_id(&self, id: &str) -> bool {
        self.legacy_ids.contains(&id)
    }

    /// Whether `columns` holds exactly this view's column ids, in any order.
    pub fn has_same_ids(&self, columns: &[ColumnDescriptor]) -> bool {
        columns.len() == self.columns.len()
            && self
                .columns
                .iter()
                .all(|&(id, _, _)| columns.iter().any(|c| c.id == id))
    }

    /// Inferred schema version of a persisted descriptor list.
    pub fn detect_version(&self, columns: &[ColumnDescriptor]) -> u32 {
        if columns.iter().any(|c| self.is_legacy_id(&c.id)) {
            1
        } else {
            CURRENT_LAYOUT_VERSION
        }
    }
}

const HOSTS: LayoutSchema = LayoutSchema {
    view: ViewKind::Hosts,
    columns: &[
        ("name", "Name", true),
        ("address", "Address", true),
        ("group", "Group", true),
        ("os", "OS", true),
        ("status", "Status", true),
        ("outdated", "Updates", true),
        ("security", "Security", true),
        ("last_seen", "Last Seen", true),
        ("category", "Category", false),
    ],
    legacy_ids: &[
        "hostname",
        "ip_address",
        "host_group",
        "os_name",
        "updates_count",
        "last_checkin",
    ],
};

const REPOSITORIES: LayoutSchema = LayoutSchema {
    view: ViewKind::Repositories,
    columns: &[
        ("name", "Name", true),
        ("category", "Type", true),
        ("address", "URL", true),
        ("group", "Group", true),
        ("status", "Status", true),
        ("outdated", "Outdated", true),
        ("last_seen", "Last Sync", true),
    ],
    legacy_ids: &["repo_name", "repo_type", "repo_url", "last_sync"],
};

const PACKAGE_DETAIL: LayoutSchema = LayoutSchema {
    view: ViewKind::PackageDetail,
    columns: &[
        ("name", "Host", true),
        ("address", "Address", true),
        ("os", "OS", true),
        ("group", "Group", true),
        ("last_seen", "Last Seen", true),
    ],
    legacy_ids: &["hostname", "ip_address", "installed_version"],
};

const REPOSITORY_DETAIL: LayoutSchema = LayoutSchema {
    view: ViewKind::RepositoryDetail,
    columns: &[
        ("name", "Package", true),
        ("category", "Section", true),
        ("outdated", "Outdated", true),
        ("last_seen", "Updated", true),
    ],
    legacy_ids: &["package_name", "pkg_version"],
};
