use crate::chromash::ToolError;
use crate::theme::ThemeProperties;
use std::path::PathBuf;
use thiserror::Error;

mod model;
mod scan;
mod store;

pub use model::WallpaperItem;
pub use scan::scan_directory;
pub use store::{StoreSettings, WallpaperStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot scan {}: {reason}", path.display())]
    Scan { path: PathBuf, reason: String },

    #[error("failed to apply wallpaper: {0}")]
    Apply(#[from] ToolError),

    #[error("no wallpapers indexed")]
    NoWallpapers,

    #[error("cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}

/// Notifications raised by [`WallpaperStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    WallpapersChanged { count: usize },
    WallpaperSet(PathBuf),
    ThemeCached {
        path: PathBuf,
        theme: ThemeProperties,
    },
    Error(String),
}
