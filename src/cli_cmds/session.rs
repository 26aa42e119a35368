use std::path::PathBuf;
use std::sync::Arc;

use crate::apps::{xdg_application_dirs, DesktopCatalog};
use crate::chromash::{Chromash, ThemeTool};
use crate::config::{Config, Options, PersistedState, StatePersister};
use crate::picker::{AppProvider, PickerCoordinator, WallpaperProvider};
use crate::utils::expand_tilde;
use crate::wallpaper::{StoreSettings, WallpaperStore};

/// Everything a command needs: config, live options and the state writer.
pub struct Session {
    config: Config,
    options: Options,
    tool: Arc<dyn ThemeTool>,
    persister: StatePersister,
}

impl Session {
    pub fn open(mut config: Config, wallpaper_dir: PathBuf) -> Self {
        config.wallpaper.directory = wallpaper_dir;

        let state_path = Config::state_path();
        let options = Options::from_config(&config, PersistedState::load_or_default(&state_path));
        let persister = StatePersister::spawn(&options, state_path);
        let tool: Arc<dyn ThemeTool> = Arc::new(Chromash::new(config.tool_path()));

        Self {
            config,
            options,
            tool,
            persister,
        }
    }

    pub fn wallpaper_dir(&self) -> PathBuf {
        self.options.wallpaper_dir.get()
    }

    fn store_settings(&self, watch: bool) -> StoreSettings {
        let mut settings = StoreSettings::from_config(&self.config);
        settings.watch_directory &= watch;
        settings
    }

    /// A store for one-shot commands; `watch` keeps it reacting to the
    /// directory.
    pub fn store(&self, watch: bool) -> WallpaperStore {
        WallpaperStore::new(
            self.options.clone(),
            Arc::clone(&self.tool),
            self.store_settings(watch),
        )
    }

    /// Picker with the app and wallpaper providers, starting on `provider` or
    /// the configured default.
    pub fn picker(&self, provider: Option<&str>) -> PickerCoordinator {
        let mut app_dirs: Vec<PathBuf> = self
            .config
            .apps
            .extra_dirs
            .iter()
            .map(|d| expand_tilde(&d.to_string_lossy()))
            .collect();
        app_dirs.extend(xdg_application_dirs());

        let catalog = Arc::new(DesktopCatalog::load(&app_dirs));
        let apps = AppProvider::new(
            catalog,
            &self.config.pinned_file(),
            self.config.apps.max_results,
        );
        let wallpapers = WallpaperProvider::new(
            self.options.clone(),
            Arc::clone(&self.tool),
            self.store_settings(false),
        );

        let start = provider.unwrap_or(&self.config.picker.default_provider);
        let mut picker = PickerCoordinator::new(start);
        picker.add_provider(Box::new(apps));
        picker.add_provider(Box::new(wallpapers));
        picker
    }

    /// Flush persisted state.
    pub async fn close(self) {
        self.persister.shutdown().await;
    }
}
