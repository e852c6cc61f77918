use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::SortKey;

/// Prefix for environment overrides, e.g. `BMVIEW_SOURCES__BASE`.
pub const ENV_PREFIX: &str = "BMVIEW_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub viewer: ViewerConfig,
    pub tui: TuiConfig,
    pub data: DataConfig,
}

/// Where bookmark JSON files come from.
///
/// Directory listing is not assumed to be available, so every file is
/// named explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Base URL (`http://`, `https://`) or local directory.
    pub base: String,
    /// File names resolved against `base`, in merge order.
    pub files: Vec<String>,
}

/// Initial view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_sort: SortKey,
    /// Quiet window before search input is applied.
    pub search_debounce_ms: u64,
    /// Page heading for rendered HTML.
    pub title: String,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
    /// Enable mouse support (clickable tag chips).
    pub mouse_enabled: bool,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default log directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            base: "public/bm_json".to_string(),
            files: vec!["bookmarks.json".to_string()],
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_sort: SortKey::DateNewest,
            search_debounce_ms: 200,
            title: "Bookmarks".to_string(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 50,
            mouse_enabled: true,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the TOML file, then `BMVIEW_*`
    /// environment variables. `path` overrides the default config location.
    ///
    /// Falls back to `Default` if the layered config cannot be extracted and
    /// hands back the error. This runs before logging exists, so reporting
    /// it is the caller's job.
    pub fn load(path: Option<&Path>) -> (Self, Option<ConfigError>) {
        match Self::try_load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Like [`AppConfig::load`] but reports invalid configuration.
    pub fn try_load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_path);

        if config_path.exists() {
            log::info!("Loading config from {}", config_path.display());
        } else {
            log::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
        }

        Self::figment(&config_path)
            .extract()
            .map_err(|e| ConfigError::Invalid {
                path: config_path,
                source: Box::new(e),
            })
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Resolved log directory (override or XDG default).
    pub fn log_dir(&self) -> PathBuf {
        self.data.log_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("bmview").join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs"))
        })
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.viewer.search_debounce_ms)
    }

    /// Event loop tick; never zero, since a zero-period interval panics.
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tui.tick_rate_ms.max(1))
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("bmview").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tui.tick_rate_ms, 50);
        assert!(config.tui.mouse_enabled);
        assert_eq!(config.viewer.search_debounce_ms, 200);
        assert_eq!(config.viewer.default_sort, SortKey::DateNewest);
        assert_eq!(config.sources.files, vec!["bookmarks.json"]);
        assert!(config.data.log_dir.is_none());
    }

    #[test]
    fn test_config_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (config, error) = AppConfig::load(Some(&dir.path().join("nope.toml")));
        assert_eq!(config.tui.tick_rate_ms, 50);
        assert!(error.is_none());
    }

    #[test]
    fn test_config_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[sources]
base = "https://example.com/bm_json/"
files = ["ai.json", "tools.json"]

[viewer]
default_sort = "title-asc"
"#,
        )
        .unwrap();

        let (config, error) = AppConfig::load(Some(&path));
        assert!(error.is_none());
        assert_eq!(config.sources.base, "https://example.com/bm_json/");
        assert_eq!(config.sources.files.len(), 2);
        assert_eq!(config.viewer.default_sort, SortKey::TitleAsc);
        // Untouched sections keep their defaults.
        assert_eq!(config.viewer.search_debounce_ms, 200);
        assert_eq!(config.tui.tick_rate_ms, 50);
    }

    #[test]
    fn test_config_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[viewer]\ndefault_sort = \"sideways\"\n").unwrap();
        let (config, error) = AppConfig::load(Some(&path));
        assert_eq!(config.viewer.default_sort, SortKey::DateNewest);
        let error = error.expect("bad value is reported");
        assert!(error.to_string().contains("config.toml"));
        assert!(error.to_string().contains("sideways"));
    }

    #[test]
    fn test_try_load_reports_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tui]\ntick_rate_ms = \"fast\"\n").unwrap();
        let err = AppConfig::try_load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_zero_tick_rate_is_clamped() {
        let mut config = AppConfig::default();
        config.tui.tick_rate_ms = 0;
        assert_eq!(config.tick_rate(), Duration::from_millis(1));
        config.tui.tick_rate_ms = 50;
        assert_eq!(config.tick_rate(), Duration::from_millis(50));
    }

    #[test]
    fn test_log_dir_override() {
        let mut config = AppConfig::default();
        config.data.log_dir = Some(PathBuf::from("/tmp/custom"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/custom"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.tui.tick_rate_ms, config.tui.tick_rate_ms);
        assert_eq!(deserialized.sources.files, config.sources.files);
    }
}
