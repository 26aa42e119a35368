use super::{PickerItem, ProviderConfig, ProviderEvent, SearchProvider, WALLPAPERS_COMMAND};
use crate::events::{EventBus, Subscription};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use image::RgbaImage;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    ProviderChanged(String),
    SearchCompleted(String),
    ResultsChanged(Vec<PickerItem>),
    VisibilityChanged(bool),
    FocusSearch,
}

/// What the result area should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewState {
    Loading,
    Results,
    NotFound,
    Empty,
}

impl ViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewState::Loading => "loading",
            ViewState::Results => "results",
            ViewState::NotFound => "not-found",
            ViewState::Empty => "empty",
        }
    }
}

pub fn derive_view_state(is_loading: bool, has_results: bool, has_query: bool) -> ViewState {
    if is_loading {
        ViewState::Loading
    } else if has_results {
        ViewState::Results
    } else if has_query {
        ViewState::NotFound
    } else {
        ViewState::Empty
    }
}

struct Registered {
    provider: Box<dyn SearchProvider>,
    events: Subscription<ProviderEvent>,
}

/// Routes one search box to whichever provider is active and mirrors that
/// provider's state for the UI.
///
/// Provider events are only ever applied for the active provider; the rest
/// are drained and dropped.
pub struct PickerCoordinator {
    providers: Vec<Registered>,
    active: String,
    search_text: String,
    has_query: bool,
    has_results: bool,
    is_loading: bool,
    current_results: Vec<PickerItem>,
    search_icon: String,
    placeholder: String,
    provider_name: String,
    visible: bool,
    events: EventBus<PickerEvent>,
}

impl PickerCoordinator {
    pub fn new(active_provider: &str) -> Self {
        Self {
            providers: Vec::new(),
            active: active_provider.to_string(),
            search_text: String::new(),
            has_query: false,
            has_results: false,
            is_loading: false,
            current_results: Vec::new(),
            search_icon: "search".to_string(),
            placeholder: "Search...".to_string(),
            provider_name: "Items".to_string(),
            visible: false,
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&self) -> Subscription<PickerEvent> {
        self.events.subscribe()
    }

    /// Register `provider` under its command, replacing any previous one.
    pub fn add_provider(&mut self, provider: Box<dyn SearchProvider>) {
        let command = provider.command().to_string();
        let events = provider.subscribe();
        let registered = Registered { provider, events };

        match self
            .providers
            .iter_mut()
            .find(|r| r.provider.command() == command)
        {
            Some(slot) => {
                slot.provider.dispose();
                *slot = registered;
            }
            None => self.providers.push(registered),
        }
        debug!("Registered provider {}", command);

        if command == self.active {
            self.mirror_active();
        }
    }

    fn find(&self, command: &str) -> Option<&Registered> {
        self.providers
            .iter()
            .find(|r| r.provider.command() == command)
    }

    fn find_mut(&mut self, command: &str) -> Option<&mut Registered> {
        self.providers
            .iter_mut()
            .find(|r| r.provider.command() == command)
    }

    fn current(&self) -> Option<&Registered> {
        self.find(&self.active)
    }

    fn current_mut(&mut self) -> Option<&mut Registered> {
        let active = self.active.clone();
        self.find_mut(&active)
    }

    /// Copy the active provider's results, loading flag and config.
    fn mirror_active(&mut self) {
        let Some(current) = self.current() else {
            return;
        };
        let state = current.provider.state();
        let config = current.provider.config();

        let results = state.results().to_vec();
        let loading = state.is_loading();
        let (icon, placeholder, name) = (
            config.icon.clone(),
            config.placeholder.clone(),
            config.name.clone(),
        );

        self.has_results = !results.is_empty();
        self.current_results = results;
        self.is_loading = loading;
        self.search_icon = icon;
        self.placeholder = placeholder;
        self.provider_name = name;
    }

    /// Apply queued provider events. Only the active provider's count.
    pub fn pump_provider_events(&mut self) {
        let mut results_changed = false;
        let mut loading = None;

        for registered in &mut self.providers {
            let events = registered.events.drain();
            if registered.provider.command() != self.active {
                continue;
            }
            for event in events {
                match event {
                    ProviderEvent::ResultsChanged => results_changed = true,
                    ProviderEvent::LoadingChanged(value) => loading = Some(value),
                }
            }
        }

        if let Some(value) = loading {
            self.is_loading = value;
        }
        if results_changed {
            let results = self
                .current()
                .map(|r| r.provider.state().results().to_vec())
                .unwrap_or_default();
            self.has_results = !results.is_empty();
            self.current_results = results.clone();
            self.events.emit(PickerEvent::ResultsChanged(results));
        }
    }

    /// Switch providers. Returns `false`, doing nothing, for an unknown or
    /// already active command.
    pub async fn set_active_provider(&mut self, command: &str) -> bool {
        if self.active == command || self.find(command).is_none() {
            return false;
        }

        self.active = command.to_string();
        self.mirror_active();
        self.events
            .emit(PickerEvent::ProviderChanged(command.to_string()));
        self.focus_search();
        self.clear_search().await;
        true
    }

    /// Run the active provider on `text`; unchanged text is ignored.
    pub async fn set_search_text(&mut self, text: &str) {
        if self.search_text == text {
            return;
        }
        self.search_text = text.to_string();
        self.has_query = !text.trim().is_empty();

        if let Some(current) = self.current_mut() {
            current.provider.search(text).await;
            self.pump_provider_events();
            self.events
                .emit(PickerEvent::SearchCompleted(text.to_string()));
        }
    }

    pub async fn clear_search(&mut self) {
        self.search_text.clear();
        self.has_query = false;

        if let Some(current) = self.current_mut() {
            current.provider.search("").await;
        }
        self.pump_provider_events();
        self.events.emit(PickerEvent::SearchCompleted(String::new()));
    }

    /// Hand `item` to the active provider, then hide.
    pub async fn activate(&mut self, item: &PickerItem) -> bool {
        let activated = match self.current_mut() {
            Some(current) => match current.provider.activate(item).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to activate {}: {:#}", item.name(), e);
                    false
                }
            },
            None => false,
        };
        self.pump_provider_events();
        self.hide();
        activated
    }

    /// Activate the first result. Returns whether one existed and the
    /// provider accepted it.
    pub async fn activate_first_result(&mut self) -> bool {
        let Some(first) = self.current_results.first().cloned() else {
            return false;
        };
        self.activate(&first).await
    }

    /// Escape hides, Enter activates the first result, Tab moves to the next
    /// provider. Returns whether the key was handled.
    pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        match key.code {
            KeyCode::Esc => {
                self.hide();
                true
            }
            KeyCode::Enter => self.activate_first_result().await,
            KeyCode::Tab => {
                self.cycle_provider().await;
                true
            }
            _ => false,
        }
    }

    async fn cycle_provider(&mut self) {
        let commands = self.available_providers();
        if commands.is_empty() {
            return;
        }
        let next = match commands.iter().position(|c| *c == self.active) {
            Some(i) => (i + 1) % commands.len(),
            None => 0,
        };
        self.set_active_provider(&commands[next]).await;
    }

    /// Refresh the active provider if it can, then rerun the current query.
    pub async fn refresh_current_provider(&mut self) {
        let query = self.search_text.clone();
        if let Some(current) = self.current_mut() {
            if !current.provider.config().features.refresh {
                return;
            }
            if let Err(e) = current.provider.refresh().await {
                warn!("Refresh failed: {:#}", e);
            }
            current.provider.search(&query).await;
        }
        self.pump_provider_events();
    }

    /// Random pick from the active provider, or from the wallpaper provider
    /// when the active one has no such feature. Returns whether any ran.
    pub async fn random_from_current_provider(&mut self) -> bool {
        let active = self.active.clone();
        let target = [active.as_str(), WALLPAPERS_COMMAND]
            .into_iter()
            .find(|command| {
                self.find(command)
                    .is_some_and(|r| r.provider.config().features.random)
            })
            .map(str::to_string);

        let Some(target) = target else {
            return false;
        };
        if let Some(registered) = self.find_mut(&target) {
            if let Err(e) = registered.provider.random().await {
                warn!("Random pick failed: {:#}", e);
            }
        }
        self.pump_provider_events();
        true
    }

    pub async fn get_thumbnail(&mut self, path: &Path) -> Option<Arc<RgbaImage>> {
        let current = self.current_mut()?;
        current.provider.get_thumbnail(path).await
    }

    /// Let every provider finish background work it started.
    pub async fn settle(&mut self) {
        for registered in &mut self.providers {
            registered.provider.settle().await;
        }
        self.pump_provider_events();
    }

    pub fn show(&mut self) {
        if !self.visible {
            self.visible = true;
            self.events.emit(PickerEvent::VisibilityChanged(true));
        }
        self.focus_search();
    }

    pub fn hide(&mut self) {
        if self.visible {
            self.visible = false;
            self.events.emit(PickerEvent::VisibilityChanged(false));
        }
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.hide();
        } else {
            self.show();
        }
    }

    fn focus_search(&self) {
        self.events.emit(PickerEvent::FocusSearch);
    }

    /// Drop every provider subscription and dispose the providers. Safe to
    /// repeat.
    pub fn dispose(&mut self) {
        for mut registered in self.providers.drain(..) {
            drop(registered.events);
            registered.provider.dispose();
        }
        self.current_results.clear();
        self.has_results = false;
        self.is_loading = false;
    }

    pub fn active_provider(&self) -> &str {
        &self.active
    }

    /// Commands in registration order.
    pub fn available_providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|r| r.provider.command().to_string())
            .collect()
    }

    pub fn current_config(&self) -> Option<&ProviderConfig> {
        self.current().map(|r| r.provider.config())
    }

    pub fn provider_config(&self, command: &str) -> Option<&ProviderConfig> {
        self.find(command).map(|r| r.provider.config())
    }

    pub fn first_result(&self) -> Option<&PickerItem> {
        self.current_results.first()
    }

    pub fn results(&self) -> &[PickerItem] {
        &self.current_results
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn has_query(&self) -> bool {
        self.has_query
    }

    pub fn has_results(&self) -> bool {
        self.has_results
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn search_icon(&self) -> &str {
        &self.search_icon
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn view_state(&self) -> ViewState {
        derive_view_state(self.is_loading, self.has_results, self.has_query)
    }
}
