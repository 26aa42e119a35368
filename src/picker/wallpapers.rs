use super::{
    Features, PickerItem, Presentation, ProviderConfig, ProviderState, SearchProvider,
    WALLPAPERS_COMMAND,
};
use crate::chromash::ThemeTool;
use crate::config::Options;
use crate::wallpaper::{StoreSettings, WallpaperStore};
use anyhow::{bail, Result};
use async_trait::async_trait;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;

/// Ingredients for the store, kept until the provider is first used.
struct StoreRecipe {
    options: Options,
    tool: Arc<dyn ThemeTool>,
    settings: StoreSettings,
}

/// Wallpaper grid backed by a lazily created [`WallpaperStore`].
pub struct WallpaperProvider {
    config: ProviderConfig,
    state: ProviderState,
    recipe: StoreRecipe,
    store: Option<WallpaperStore>,
}

impl WallpaperProvider {
    pub fn new(options: Options, tool: Arc<dyn ThemeTool>, settings: StoreSettings) -> Self {
        Self {
            config: ProviderConfig {
                command: WALLPAPERS_COMMAND.to_string(),
                icon: "Image_Search".to_string(),
                name: "Wallpapers".to_string(),
                placeholder: "Search wallpapers...".to_string(),
                presentation: Presentation::Grid,
                max_results: settings.max_items,
                features: Features {
                    refresh: true,
                    random: true,
                },
            },
            state: ProviderState::new(),
            recipe: StoreRecipe {
                options,
                tool,
                settings,
            },
            store: None,
        }
    }

    /// The store, created on first call.
    pub fn store(&mut self) -> &mut WallpaperStore {
        let recipe = &self.recipe;
        self.store.get_or_insert_with(|| {
            WallpaperStore::new(
                recipe.options.clone(),
                Arc::clone(&recipe.tool),
                recipe.settings.clone(),
            )
        })
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }
}

#[async_trait]
impl SearchProvider for WallpaperProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn state(&self) -> &ProviderState {
        &self.state
    }

    async fn search(&mut self, query: &str) {
        self.state.set_loading(true);

        let max = self.config.max_results;
        let mut items = self.store().search(query).await;
        items.truncate(max);

        self.state
            .set_results(items.into_iter().map(PickerItem::Wallpaper).collect());
        self.state.set_loading(false);
    }

    async fn activate(&mut self, item: &PickerItem) -> Result<()> {
        match item {
            PickerItem::Wallpaper(wallpaper) => Ok(self.store().set_wallpaper(wallpaper).await?),
            other => bail!("{} is not a wallpaper", other.name()),
        }
    }

    async fn refresh(&mut self) -> Result<()> {
        self.store().refresh().await;
        Ok(())
    }

    async fn random(&mut self) -> Result<()> {
        self.store().set_random_wallpaper().await?;
        Ok(())
    }

    async fn get_thumbnail(&mut self, path: &Path) -> Option<Arc<RgbaImage>> {
        self.store().get_thumbnail(path).await
    }

    async fn settle(&mut self) {
        if let Some(store) = self.store.as_mut() {
            store.settle().await;
        }
    }

    fn dispose(&mut self) {
        if let Some(mut store) = self.store.take() {
            store.dispose();
        }
    }
}
