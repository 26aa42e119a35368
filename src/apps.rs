//! Installed applications, read from XDG .desktop files.

use crate::fuzzy::FuzzyIndex;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

mod desktop_entry;
mod pinned;

pub use desktop_entry::{parse_desktop_entry, strip_field_codes};
pub use pinned::{load_pinned, sort_pinned_first};

const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";
const DEFAULT_TERMINAL: &str = "xterm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppEntry {
    /// Desktop-file id, e.g. `firefox.desktop`
    pub id: String,
    pub name: String,
    pub comment: Option<String>,
    /// Command line with field codes removed
    pub exec: String,
    pub icon: Option<String>,
    pub terminal: bool,
}

impl AppEntry {
    /// Shell command that starts the app.
    pub fn command_line(&self) -> String {
        if self.terminal {
            let terminal =
                std::env::var("TERMINAL").unwrap_or_else(|_| DEFAULT_TERMINAL.to_string());
            format!("{} -e {}", terminal, self.exec)
        } else {
            self.exec.clone()
        }
    }
}

/// Source of launchable applications.
#[async_trait]
pub trait AppCatalog: Send + Sync {
    async fn list(&self) -> Vec<AppEntry>;

    /// Apps whose name matches `query`, best first.
    async fn fuzzy_query(&self, query: &str) -> Vec<AppEntry>;

    async fn launch(&self, app: &AppEntry) -> Result<()>;
}

/// Catalog built from the .desktop files in the XDG application dirs.
pub struct DesktopCatalog {
    index: FuzzyIndex<AppEntry>,
}

impl DesktopCatalog {
    /// Scan `dirs` in order; an id found earlier shadows later ones.
    pub fn load(dirs: &[PathBuf]) -> Self {
        let mut seen = HashSet::new();
        let mut apps = Vec::new();

        for dir in dirs {
            for (id, path) in desktop_files(dir) {
                if !seen.insert(id.clone()) {
                    continue;
                }
                let Ok(content) = std::fs::read_to_string(&path) else {
                    debug!("Skipping unreadable {}", path.display());
                    continue;
                };
                if let Some(app) = parse_desktop_entry(&id, &content) {
                    apps.push(app);
                }
            }
        }

        info!("Found {} applications", apps.len());
        Self {
            index: FuzzyIndex::new(apps, |app| app.name.clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[async_trait]
impl AppCatalog for DesktopCatalog {
    async fn list(&self) -> Vec<AppEntry> {
        self.index.items().cloned().collect()
    }

    async fn fuzzy_query(&self, query: &str) -> Vec<AppEntry> {
        self.index
            .search(query, usize::MAX)
            .into_iter()
            .cloned()
            .collect()
    }

    async fn launch(&self, app: &AppEntry) -> Result<()> {
        launch_detached(&app.command_line())
            .with_context(|| format!("Failed to launch {}", app.name))
    }
}

/// Start `command` through `sh -c` without waiting for it.
pub fn launch_detached(command: &str) -> Result<()> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    info!("Launched {}", command);
    tokio::spawn(async move {
        let _ = child.wait().await;
    });
    Ok(())
}

/// `$XDG_DATA_HOME/applications`, then each `$XDG_DATA_DIRS/applications`.
pub fn xdg_application_dirs() -> Vec<PathBuf> {
    let mut found = Vec::new();
    if let Some(data_home) = std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .or_else(dirs::data_dir)
    {
        found.push(data_home.join("applications"));
    }

    let data_dirs = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DATA_DIRS.to_string());
    found.extend(
        data_dirs
            .split(':')
            .filter(|d| !d.is_empty())
            .map(|d| Path::new(d).join("applications")),
    );
    found
}

/// (desktop-file id, path) for every .desktop file below `dir`.
fn desktop_files(dir: &Path) -> Vec<(String, PathBuf)> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "desktop"))
        .filter_map(|e| {
            let relative = e.path().strip_prefix(dir).ok()?;
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("-");
            Some((id, e.into_path()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn desktop(dir: &Path, rel: &str, name: &str, exec: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!("[Desktop Entry]\nType=Application\nName={name}\nExec={exec}\n"),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn earlier_dirs_shadow_later_ones() {
        let user = tempfile::tempdir().unwrap();
        let system = tempfile::tempdir().unwrap();
        desktop(user.path(), "firefox.desktop", "Firefox Dev", "firefox-dev");
        desktop(system.path(), "firefox.desktop", "Firefox", "firefox %u");
        desktop(system.path(), "kde/konsole.desktop", "Konsole", "konsole");

        let catalog = DesktopCatalog::load(&[user.path().to_path_buf(), system.path().to_path_buf()]);
        let apps = catalog.list().await;
        assert_eq!(apps.len(), 2);

        let firefox = apps.iter().find(|a| a.id == "firefox.desktop").unwrap();
        assert_eq!(firefox.exec, "firefox-dev");
        assert!(apps.iter().any(|a| a.id == "kde-konsole.desktop"));
    }

    #[tokio::test]
    async fn fuzzy_query_matches_names() {
        let dir = tempfile::tempdir().unwrap();
        desktop(dir.path(), "a.desktop", "Thunderbird", "thunderbird");
        desktop(dir.path(), "b.desktop", "Foot", "foot");

        let catalog = DesktopCatalog::load(&[dir.path().to_path_buf()]);
        let hits = catalog.fuzzy_query("thun").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Thunderbird");
    }

    #[test]
    fn terminal_apps_run_in_a_terminal() {
        let app = AppEntry {
            id: "htop.desktop".into(),
            name: "htop".into(),
            comment: None,
            exec: "htop".into(),
            icon: None,
            terminal: true,
        };
        assert!(app.command_line().ends_with(" -e htop"));
    }

    #[test]
    fn missing_dirs_are_ignored() {
        let catalog = DesktopCatalog::load(&[PathBuf::from("/nonexistent/applications")]);
        assert!(catalog.is_empty());
    }
}
