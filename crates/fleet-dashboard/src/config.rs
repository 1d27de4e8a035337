//! Dashboard settings, persisted as TOML in the user's config directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fleet_cache::CacheConfig;
use fleet_table::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Largest page size the table renders.
pub const MAX_PAGE_SIZE: usize = 500;

// =============================================================================
// ROOT SETTINGS
// =============================================================================

/// Dashboard settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Query cache staleness windows.
    pub cache: CacheSettings,

    /// Table defaults.
    pub table: TableSettings,

    /// Where column layouts live.
    pub storage: StorageSettings,
}

impl DashboardConfig {
    /// Load settings from the default path, migrating stale values.
    pub fn load() -> Self {
        let path = Self::config_path();
        let mut config = Self::load_from(&path);
        if config.migrate() {
            if let Err(error) = config.save_to(&path) {
                tracing::warn!(%error, "could not save migrated settings");
            }
        }
        config
    }

    /// Load settings from a specific path. Missing or unparsable files yield
    /// the defaults.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "unreadable settings, using defaults");
                Self::default()
            }
        }
    }

    /// Bring out-of-range values back to something the dashboard can use.
    /// Returns whether anything changed.
    pub fn migrate(&mut self) -> bool {
        let mut changed = false;
        if self.table.page_size > MAX_PAGE_SIZE {
            self.table.page_size = MAX_PAGE_SIZE;
            changed = true;
        }
        // Zero disabled caching in older builds; groups must always be cached.
        if self.cache.groups_stale_secs == Some(0) {
            self.cache.groups_stale_secs = None;
            changed = true;
        }
        changed
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let fail = |reason: String| DashboardError::ConfigSave {
            path: path.to_path_buf(),
            reason,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| fail(format!("failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| fail(format!("failed to serialize settings: {e}")))?;
        std::fs::write(path, content).map_err(|e| fail(format!("failed to write settings: {e}")))
    }

    /// Default settings file path.
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }

    /// Directory for per-view column layouts.
    pub fn layout_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.layout_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join("layouts"))
            .unwrap_or_else(|| PathBuf::from("layouts"))
    }

    pub fn cache_config(&self) -> CacheConfig {
        self.cache.to_cache_config()
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io", "FleetDashboard", "fleet")
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Staleness windows in seconds. Per-kind values override the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub default_stale_secs: u64,
    pub collection_stale_secs: Option<u64>,
    pub detail_stale_secs: Option<u64>,
    pub groups_stale_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_stale_secs: 30,
            collection_stale_secs: None,
            detail_stale_secs: Some(60),
            groups_stale_secs: Some(300),
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        let secs = |value: Option<u64>| Duration::from_secs(value.unwrap_or(self.default_stale_secs));
        CacheConfig {
            collection_stale_time: secs(self.collection_stale_secs),
            detail_stale_time: secs(self.detail_stale_secs),
            groups_stale_time: secs(self.groups_stale_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Rows per page; `0` shows everything.
    pub page_size: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Overrides the platform data directory.
    pub layout_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = DashboardConfig::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn garbage_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "page_size = [").unwrap();
        assert_eq!(DashboardConfig::load_from(&path), DashboardConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[table]\npage_size = 20\n").unwrap();

        let config = DashboardConfig::load_from(&path);
        assert_eq!(config.table.page_size, 20);
        assert_eq!(config.cache, CacheSettings::default());
    }

    #[test]
    fn save_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let mut config = DashboardConfig::default();
        config.storage.layout_dir = Some(dir.path().join("layouts"));
        config.cache.collection_stale_secs = Some(5);

        config.save_to(&path).unwrap();
        assert_eq!(DashboardConfig::load_from(&path), config);
        assert_eq!(config.layout_dir(), dir.path().join("layouts"));
    }

    #[test]
    fn migrate_clamps_out_of_range_values() {
        let mut config = DashboardConfig::default();
        config.table.page_size = 10_000;
        config.cache.groups_stale_secs = Some(0);

        assert!(config.migrate());
        assert_eq!(config.table.page_size, MAX_PAGE_SIZE);
        assert!(!config.migrate());
    }

    #[test]
    fn cache_windows_fall_back_to_default() {
        let settings = CacheSettings {
            default_stale_secs: 10,
            collection_stale_secs: None,
            detail_stale_secs: Some(2),
            groups_stale_secs: None,
        };
        let cache = settings.to_cache_config();
        assert_eq!(cache.collection_stale_time, Duration::from_secs(10));
        assert_eq!(cache.detail_stale_time, Duration::from_secs(2));
        assert_eq!(cache.groups_stale_time, Duration::from_secs(10));
    }
}
