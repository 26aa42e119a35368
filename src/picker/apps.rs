use super::{
    Features, PickerItem, Presentation, ProviderConfig, ProviderState, SearchProvider,
    APPS_COMMAND,
};
use crate::apps::{load_pinned, sort_pinned_first, AppCatalog};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Application launcher. Pinned apps always lead, in pin order.
pub struct AppProvider {
    config: ProviderConfig,
    state: ProviderState,
    catalog: Arc<dyn AppCatalog>,
    pinned: Vec<String>,
}

impl AppProvider {
    pub fn new(catalog: Arc<dyn AppCatalog>, pinned_file: &Path, max_results: usize) -> Self {
        Self::with_pinned(catalog, load_pinned(pinned_file), max_results)
    }

    pub fn with_pinned(
        catalog: Arc<dyn AppCatalog>,
        pinned: Vec<String>,
        max_results: usize,
    ) -> Self {
        Self {
            config: ProviderConfig {
                command: APPS_COMMAND.to_string(),
                icon: "Apps".to_string(),
                name: "Apps".to_string(),
                placeholder: "Search apps...".to_string(),
                presentation: Presentation::List,
                max_results,
                features: Features::default(),
            },
            state: ProviderState::new(),
            catalog,
            pinned,
        }
    }

    pub fn pinned(&self) -> &[String] {
        &self.pinned
    }
}

#[async_trait]
impl SearchProvider for AppProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn state(&self) -> &ProviderState {
        &self.state
    }

    async fn search(&mut self, query: &str) {
        self.state.set_loading(true);

        let query = query.trim();
        let mut apps = if query.is_empty() {
            self.catalog.list().await
        } else {
            self.catalog.fuzzy_query(query).await
        };
        sort_pinned_first(&mut apps, &self.pinned);
        apps.truncate(self.config.max_results);

        self.state
            .set_results(apps.into_iter().map(PickerItem::App).collect());
        self.state.set_loading(false);
    }

    async fn activate(&mut self, item: &PickerItem) -> Result<()> {
        match item {
            PickerItem::App(app) => self.catalog.launch(app).await,
            other => bail!("{} is not an application", other.name()),
        }
    }
}
