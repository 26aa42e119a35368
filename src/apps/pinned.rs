use super::AppEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PinnedFile {
    #[serde(default)]
    pinned: Vec<String>,
}

/// Read the ordered list of pinned desktop-file ids.
///
/// A missing file is created empty. An unreadable or invalid one yields no
/// pins and is left untouched.
pub fn load_pinned(path: &Path) -> Vec<String> {
    if !path.exists() {
        create_default(path);
        return Vec::new();
    }

    let parsed = fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|data| Ok(serde_json::from_str::<PinnedFile>(&data)?));
    match parsed {
        Ok(file) => {
            info!("Loaded {} pinned apps", file.pinned.len());
            file.pinned
        }
        Err(e) => {
            warn!("Failed to load pinned apps from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn create_default(path: &Path) {
    let write = || -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&PinnedFile::default())?)?;
        Ok(())
    };
    match write() {
        Ok(()) => info!("Created default pinned apps file at {}", path.display()),
        Err(e) => warn!("Failed to create {}: {}", path.display(), e),
    }
}

/// Pinned apps first in pin order, then everything else by name.
pub fn sort_pinned_first(apps: &mut [AppEntry], pinned: &[String]) {
    let rank = |app: &AppEntry| pinned.iter().position(|id| *id == app.id);
    apps.sort_by(|a, b| match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
}
