use serde::Serialize;
use std::path::{Path, PathBuf};

const WALLPAPER_DESCRIPTION: &str = "Image";
const WALLPAPER_ICON: &str = "image-x-generic";

/// One indexed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WallpaperItem {
    /// Absolute path as a string; unique within a scan
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon_name: String,
    pub path: PathBuf,
}

impl WallpaperItem {
    pub fn from_path(path: &Path) -> Self {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Self {
            id: path.to_string_lossy().into_owned(),
            name,
            description: WALLPAPER_DESCRIPTION.to_string(),
            icon_name: WALLPAPER_ICON.to_string(),
            path,
        }
    }
}
