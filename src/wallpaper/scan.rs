use super::{StoreError, WallpaperItem};
use crate::utils::{is_hidden, is_image_content};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walk `dir` down to `depth` directory levels and collect image files,
/// sorted by name (case-insensitive), then by path.
pub fn scan_directory(
    dir: &Path,
    depth: usize,
    include_hidden: bool,
) -> Result<Vec<WallpaperItem>, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::Scan {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let candidates: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .max_depth(depth + 1)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || include_hidden || !is_hidden(e.path()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    let mut items: Vec<WallpaperItem> = candidates
        .par_iter()
        .filter(|p| is_image_content(p))
        .map(|p| WallpaperItem::from_path(p))
        .collect();

    items.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.path.cmp(&b.path))
    });
    items.dedup_by(|a, b| a.id == b.id);

    Ok(items)
}
