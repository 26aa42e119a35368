use crate::utils::expand_tilde;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

mod option;
mod state;

pub use option::{ConfigOption, OptionSubscription};
pub use state::{Options, PersistedState, StatePersister};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

const APP_QUALIFIER: (&str, &str, &str) = ("com", "mrmattias", "frostpick");

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub wallpaper: WallpaperConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub apps: AppsConfig,
    #[serde(default)]
    pub picker: PickerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallpaperConfig {
    pub directory: PathBuf,
    /// Include dotfiles and dot-directories when scanning
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,
    /// How many directory levels below `directory` are walked
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,
    /// Maximum number of wallpapers returned by a search
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_thumbnail_cache_size")]
    pub thumbnail_cache_size: usize,
    #[serde(default = "default_theme_cache_size")]
    pub theme_cache_size: usize,
    /// Rescan when files in the directory change
    #[serde(default = "default_true")]
    pub watch_directory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Path to the chromash executable
    pub tool_path: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Pause between `wallpaper` and `export-colors`
    #[serde(default = "default_apply_settle_ms")]
    pub apply_settle_ms: u64,
    /// Send a desktop notification once a theme is derived
    #[serde(default = "default_true")]
    pub notify: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppsConfig {
    /// Pinned app list; defaults to `pickerapps.json` in the config dir
    #[serde(default)]
    pub pinned_file: Option<PathBuf>,
    #[serde(default = "default_app_results")]
    pub max_results: usize,
    /// Application dirs searched before the XDG ones
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerConfig {
    pub default_provider: String,
}

fn default_true() -> bool {
    true
}

fn default_include_hidden() -> bool {
    true
}

fn default_scan_depth() -> usize {
    2
}

fn default_max_items() -> usize {
    12
}

fn default_thumbnail_cache_size() -> usize {
    50
}

fn default_theme_cache_size() -> usize {
    100
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_apply_settle_ms() -> u64 {
    100
}

fn default_app_results() -> usize {
    8
}

impl Default for WallpaperConfig {
    fn default() -> Self {
        Self {
            directory: dirs::picture_dir()
                .map(|p| p.join("wallpapers"))
                .unwrap_or_else(|| PathBuf::from("~/Pictures/wallpapers")),
            include_hidden: default_include_hidden(),
            scan_depth: default_scan_depth(),
            max_items: default_max_items(),
            thumbnail_cache_size: default_thumbnail_cache_size(),
            theme_cache_size: default_theme_cache_size(),
            watch_directory: true,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            tool_path: "~/.config/chromash/chromash".to_string(),
            debounce_ms: default_debounce_ms(),
            apply_settle_ms: default_apply_settle_ms(),
            notify: true,
        }
    }
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            pinned_file: None,
            max_results: default_app_results(),
            extra_dirs: Vec::new(),
        }
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            default_provider: "apps".to_string(),
        }
    }
}

impl Config {
    fn project_dirs() -> Option<directories::ProjectDirs> {
        let (qualifier, organization, application) = APP_QUALIFIER;
        directories::ProjectDirs::from(qualifier, organization, application)
    }

    pub fn config_dir() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn cache_dir() -> PathBuf {
        Self::project_dirs()
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("/tmp/frostpick"))
    }

    /// Return the path to the configuration file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Where the current wallpaper and the theme cache are kept.
    pub fn state_path() -> PathBuf {
        Self::cache_dir().join("state.json")
    }

    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from file, creating default if missing or corrupt.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            match Self::parse(&data) {
                Ok(config) => Ok(config),
                Err(e) => {
                    warn!(
                        "Failed to parse config at {}: {}; using defaults",
                        path.display(),
                        e
                    );
                    let config = Config::default();
                    config.save_to(path)?;
                    Ok(config)
                }
            }
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(data)?)
    }

    /// Save config to file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = toml::to_string_pretty(self)?;
        fs::write(path, data)?;

        Ok(())
    }

    /// Get wallpaper directory, expanding ~ if needed.
    pub fn wallpaper_dir(&self) -> PathBuf {
        expand_tilde(&self.wallpaper.directory.to_string_lossy())
    }

    pub fn tool_path(&self) -> PathBuf {
        expand_tilde(&self.theme.tool_path)
    }

    pub fn pinned_file(&self) -> PathBuf {
        self.apps
            .pinned_file
            .as_ref()
            .map(|p| expand_tilde(&p.to_string_lossy()))
            .unwrap_or_else(|| Self::config_dir().join("pickerapps.json"))
    }
}
