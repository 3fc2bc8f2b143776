use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};
use crate::favorites::DEFAULT_RECENT_LIMIT;
use crate::query::SortOrder;
use crate::stats::MAX_EXTRA_YEARS;

/// Root configuration, loaded from `~/.config/shelfwise/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub favorites: FavoritesConfig,
    pub list: ListConfig,
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub library_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    /// Bound of the recently-added projection.
    pub recent_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub default_sort: SortOrder,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Years before the current one that are always offered.
    pub extra_years: u32,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("shelfwise");
        Self {
            library_path: data_dir.to_string_lossy().to_string(),
        }
    }
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_sort: SortOrder::RecentlyAdded,
            page_size: 10,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { extra_years: 1 }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// `$SHELFWISE_CONFIG`, else `~/.config/shelfwise/config.toml`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SHELFWISE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("shelfwise")
            .join("config.toml")
    }

    /// Missing file means defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.list.page_size == 0 {
            return Err(ShelfError::ConfigError("list.page_size must be at least 1".into()));
        }
        if self.stats.extra_years > MAX_EXTRA_YEARS {
            return Err(ShelfError::ConfigError(format!(
                "stats.extra_years must be at most {MAX_EXTRA_YEARS}"
            )));
        }
        if self.core.library_path.trim().is_empty() {
            return Err(ShelfError::ConfigError("core.library_path is empty".into()));
        }
        Ok(())
    }

    pub fn set_library_path(&mut self, path: impl Into<String>) {
        self.core.library_path = path.into();
    }

    /// Flattened `section.key = value` pairs, in file order.
    pub fn entries(&self) -> Vec<(String, String)> {
        vec![
            ("core.library_path".into(), self.core.library_path.clone()),
            ("favorites.recent_limit".into(), self.favorites.recent_limit.to_string()),
            ("list.default_sort".into(), self.list.default_sort.to_string()),
            ("list.page_size".into(), self.list.page_size.to_string()),
            ("stats.extra_years".into(), self.stats.extra_years.to_string()),
        ]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    // ─── Derived paths ─────────────────────────────────────

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.core.library_path).join("shelfwise.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.favorites.recent_limit, 3);
        assert_eq!(cfg.list.page_size, 10);
        assert_eq!(cfg.list.default_sort, SortOrder::RecentlyAdded);
        assert_eq!(cfg.stats.extra_years, 1);
        assert!(!cfg.core.library_path.is_empty());
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.set_library_path(dir.path().to_string_lossy());
        cfg.list.default_sort = SortOrder::Title;
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[favorites]\nrecent_limit = 5\n").unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.favorites.recent_limit, 5);
        assert_eq!(cfg.list.page_size, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[list]\npage_size = 0\n").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ShelfError::ConfigError(_))));

        std::fs::write(&path, "[stats]\nextra_years = 4294967295\n").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ShelfError::ConfigError(_))));

        std::fs::write(&path, "[stats]\nextra_years = 100\n").unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().stats.extra_years, 100);

        std::fs::write(&path, "[list]\ndefault_sort = \"shuffle\"\n").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ShelfError::TomlParse(_))));
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = AppConfig::load_from(Path::new("/tmp/nonexistent_shelfwise_config.toml")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_get_and_paths() {
        let mut cfg = AppConfig::default();
        cfg.set_library_path("/srv/books");
        assert_eq!(cfg.get("core.library_path").as_deref(), Some("/srv/books"));
        assert_eq!(cfg.get("list.default_sort").as_deref(), Some("recently-added"));
        assert_eq!(cfg.get("nope"), None);
        assert_eq!(cfg.database_path(), PathBuf::from("/srv/books/shelfwise.db"));
    }
}
