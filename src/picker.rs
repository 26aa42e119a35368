//! Search-box backend: pluggable providers behind one coordinator.

use crate::apps::AppEntry;
use crate::wallpaper::WallpaperItem;
use serde::Serialize;
use std::path::Path;

mod apps;
mod coordinator;
mod provider;
mod wallpapers;

pub use apps::AppProvider;
pub use coordinator::{derive_view_state, PickerCoordinator, PickerEvent, ViewState};
pub use provider::{ProviderEvent, ProviderState, SearchProvider};
pub use wallpapers::WallpaperProvider;

/// Command of the provider `random` falls back to.
pub const WALLPAPERS_COMMAND: &str = "wallpapers";
pub const APPS_COMMAND: &str = "apps";

/// Anything a provider can list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PickerItem {
    App(AppEntry),
    Wallpaper(WallpaperItem),
}

impl PickerItem {
    pub fn id(&self) -> &str {
        match self {
            PickerItem::App(app) => &app.id,
            PickerItem::Wallpaper(wp) => &wp.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PickerItem::App(app) => &app.name,
            PickerItem::Wallpaper(wp) => &wp.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            PickerItem::App(app) => app.comment.as_deref(),
            PickerItem::Wallpaper(wp) => Some(&wp.description),
        }
    }

    pub fn icon_name(&self) -> Option<&str> {
        match self {
            PickerItem::App(app) => app.icon.as_deref(),
            PickerItem::Wallpaper(wp) => Some(&wp.icon_name),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            PickerItem::App(_) => None,
            PickerItem::Wallpaper(wp) => Some(&wp.path),
        }
    }
}

/// How the UI should lay results out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    List,
    Grid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Features {
    pub refresh: bool,
    pub random: bool,
}

/// Static description of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    /// Routing key
    pub command: String,
    pub icon: String,
    pub name: String,
    pub placeholder: String,
    pub presentation: Presentation,
    pub max_results: usize,
    pub features: Features,
}
