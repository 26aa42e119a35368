use super::{Config, ConfigError, ConfigOption};
use crate::theme::{CachedThemeEntry, ThemeCacheMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Changes landing within this window are written out together.
const PERSIST_COALESCE: Duration = Duration::from_millis(50);

/// What survives between runs: the current wallpaper and the theme cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub current_wallpaper: Option<PathBuf>,
    #[serde(default)]
    pub theme_cache: ThemeCacheMap,
}

/// Raw on-disk shape; theme entries are checked one at a time.
#[derive(Deserialize)]
struct RawState {
    #[serde(default)]
    current_wallpaper: Option<PathBuf>,
    #[serde(default)]
    theme_cache: BTreeMap<String, serde_json::Value>,
}

impl PersistedState {
    /// Read the state file. Missing file is an empty state; a malformed theme
    /// entry is dropped without failing the rest.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let raw: RawState = serde_json::from_str(&data)?;
        let mut theme_cache = ThemeCacheMap::new();
        for (key, value) in raw.theme_cache {
            match serde_json::from_value::<CachedThemeEntry>(value) {
                Ok(entry) => {
                    theme_cache.insert(key, entry);
                }
                Err(e) => debug!("Dropping malformed theme cache entry {}: {}", key, e),
            }
        }

        Ok(Self {
            current_wallpaper: raw.current_wallpaper,
            theme_cache,
        })
    }

    /// Like [`PersistedState::load`], but any failure yields an empty state.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("Ignoring unreadable state file {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data).map_err(io_err)
    }
}

/// The reactive options the wallpaper side reads and writes.
#[derive(Debug, Clone)]
pub struct Options {
    pub wallpaper_dir: ConfigOption<PathBuf>,
    pub current_wallpaper: ConfigOption<Option<PathBuf>>,
    pub thumbnail_cache_size: ConfigOption<usize>,
    pub theme_cache_size: ConfigOption<usize>,
    pub theme_cache: ConfigOption<ThemeCacheMap>,
}

impl Options {
    pub fn from_config(config: &Config, state: PersistedState) -> Self {
        Self {
            wallpaper_dir: ConfigOption::new("wallpaper.directory", config.wallpaper_dir()),
            current_wallpaper: ConfigOption::new("wallpaper.current", state.current_wallpaper),
            thumbnail_cache_size: ConfigOption::new(
                "wallpaper.thumbnail-cache-size",
                config.wallpaper.thumbnail_cache_size,
            ),
            theme_cache_size: ConfigOption::new(
                "wallpaper.theme-cache-size",
                config.wallpaper.theme_cache_size,
            ),
            theme_cache: ConfigOption::new("wallpaper.theme-cache", state.theme_cache),
        }
    }

    /// Defaults pointed at `dir`, nothing persisted.
    pub fn in_memory(dir: PathBuf) -> Self {
        let mut config = Config::default();
        config.wallpaper.directory = dir;
        Self::from_config(&config, PersistedState::default())
    }

    pub fn snapshot_state(&self) -> PersistedState {
        PersistedState {
            current_wallpaper: self.current_wallpaper.get(),
            theme_cache: self.theme_cache.get(),
        }
    }
}

/// Background task mirroring the persisted options into the state file.
pub struct StatePersister {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl StatePersister {
    pub fn spawn(options: &Options, path: PathBuf) -> Self {
        let options = options.clone();
        let mut wallpaper = options.current_wallpaper.subscribe();
        let mut themes = options.theme_cache.subscribe();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = wallpaper.changed() => if changed.is_none() { break },
                    changed = themes.changed() => if changed.is_none() { break },
                    _ = &mut shutdown_rx => break,
                }
                tokio::time::sleep(PERSIST_COALESCE).await;
                wallpaper.latest();
                themes.latest();
                write_state(&options, &path);
            }
            write_state(&options, &path);
        });

        Self {
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    /// Stop watching and write the final state.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("State persister ended abnormally: {}", e);
        }
    }
}

fn write_state(options: &Options, path: &Path) {
    match options.snapshot_state().save(path) {
        Ok(()) => debug!("Saved state to {}", path.display()),
        Err(e) => warn!("Failed to save state: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{ColorScheme, ThemeMode, ThemeProperties};

    fn entry(mode: ThemeMode, timestamp: u64) -> CachedThemeEntry {
        CachedThemeEntry {
            theme: ThemeProperties::new(mode, ColorScheme::Vibrant),
            timestamp,
        }
    }

    #[test]
    fn missing_state_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = PersistedState::load(&dir.path().join("state.json")).unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn malformed_entries_are_dropped_individually() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{
                "current_wallpaper": "/w/a.png",
                "theme_cache": {
                    "/w/a.png": {"tone":80,"chroma":40,"mode":"light","scheme":"vibrant","timestamp":7},
                    "/w/b.png": {"mode":"sepia"}
                }
            }"#,
        )
        .unwrap();

        let state = PersistedState::load(&path).unwrap();
        assert_eq!(state.current_wallpaper, Some(PathBuf::from("/w/a.png")));
        assert_eq!(state.theme_cache.len(), 1);
        assert_eq!(state.theme_cache["/w/a.png"].timestamp, 7);
    }

    #[test]
    fn corrupt_file_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(PersistedState::load(&path).is_err());
        assert_eq!(PersistedState::load_or_default(&path), PersistedState::default());
    }

    #[tokio::test]
    async fn persister_writes_changes_and_flushes_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache/state.json");
        let options = Options::in_memory(dir.path().to_path_buf());
        let persister = StatePersister::spawn(&options, path.clone());

        options
            .current_wallpaper
            .set(Some(PathBuf::from("/w/night.png")));
        options.theme_cache.update(|map| {
            map.insert("/w/night.png".into(), entry(ThemeMode::Dark, 99));
        });
        persister.shutdown().await;

        let state = PersistedState::load(&path).unwrap();
        assert_eq!(state.current_wallpaper, Some(PathBuf::from("/w/night.png")));
        assert_eq!(state.theme_cache["/w/night.png"], entry(ThemeMode::Dark, 99));
    }
}
