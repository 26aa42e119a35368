use super::{PickerItem, ProviderConfig};
use crate::events::{EventBus, Subscription};
use anyhow::Result;
use async_trait::async_trait;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEvent {
    ResultsChanged,
    LoadingChanged(bool),
}

/// Results and loading flag shared by every provider, plus their change feed.
#[derive(Default)]
pub struct ProviderState {
    results: Vec<PickerItem>,
    loading: bool,
    events: EventBus<ProviderEvent>,
}

impl ProviderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[PickerItem] {
        &self.results
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn first_result(&self) -> Option<&PickerItem> {
        self.results.first()
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn set_results(&mut self, results: Vec<PickerItem>) {
        self.results = results;
        self.events.emit(ProviderEvent::ResultsChanged);
    }

    pub fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.events.emit(ProviderEvent::LoadingChanged(loading));
        }
    }

    pub fn subscribe(&self) -> Subscription<ProviderEvent> {
        self.events.subscribe()
    }
}

/// A source of searchable, activatable items.
///
/// `search` reports through [`ProviderState`] rather than returning results,
/// so every provider is observed the same way. `refresh` and `random` are
/// only called when the matching [`super::Features`] flag is set.
#[async_trait]
pub trait SearchProvider: Send {
    fn config(&self) -> &ProviderConfig;

    fn state(&self) -> &ProviderState;

    fn command(&self) -> &str {
        &self.config().command
    }

    async fn search(&mut self, query: &str);

    async fn activate(&mut self, item: &PickerItem) -> Result<()>;

    async fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    async fn random(&mut self) -> Result<()> {
        Ok(())
    }

    async fn get_thumbnail(&mut self, _path: &Path) -> Option<Arc<RgbaImage>> {
        None
    }

    /// Wait for background work started by `activate` to land.
    async fn settle(&mut self) {}

    fn dispose(&mut self) {}

    fn subscribe(&self) -> Subscription<ProviderEvent> {
        self.state().subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_only_notifies_on_change() {
        let mut state = ProviderState::new();
        let mut events = state.subscribe();

        state.set_loading(false);
        state.set_loading(true);
        state.set_loading(true);
        state.set_results(Vec::new());
        state.set_loading(false);

        assert_eq!(
            events.drain(),
            vec![
                ProviderEvent::LoadingChanged(true),
                ProviderEvent::ResultsChanged,
                ProviderEvent::LoadingChanged(false),
            ]
        );
        assert!(!state.has_results());
    }
}
