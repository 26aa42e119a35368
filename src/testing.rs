//! Recording fakes for unit tests.

use crate::apps::{AppCatalog, AppEntry};
use crate::chromash::{ThemeTool, ToolError};
use crate::fuzzy::FuzzyIndex;
use crate::theme::ThemeMode;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub struct FakeTool {
    available: bool,
    theme_output: String,
    fail_theme: AtomicBool,
    fail_wallpaper: AtomicBool,
    theme_delay: Mutex<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeTool {
    pub fn with_theme(output: &str) -> Self {
        Self {
            available: true,
            theme_output: output.to_string(),
            fail_theme: AtomicBool::new(false),
            fail_wallpaper: AtomicBool::new(false),
            theme_delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::with_theme("")
        }
    }

    pub fn fail_theme(&self) {
        self.fail_theme.store(true, Ordering::SeqCst);
    }

    pub fn fail_wallpaper(&self) {
        self.fail_wallpaper.store(true, Ordering::SeqCst);
    }

    pub fn set_theme_delay(&self, delay: Duration) {
        *self.theme_delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many recorded calls start with `name`.
    pub fn calls_named(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(' ').next() == Some(name))
            .count()
    }

    fn record(&self, call: String) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(call);
        if self.available {
            Ok(())
        } else {
            Err(ToolError::Unavailable(PathBuf::from("/fake/chromash")))
        }
    }

    fn failed(command: &str) -> ToolError {
        ToolError::Failed {
            command: command.to_string(),
            status: "exit status: 1".to_string(),
            stderr: "fake failure".to_string(),
        }
    }
}

#[async_trait]
impl ThemeTool for FakeTool {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn wallpaper(&self, path: &Path) -> Result<(), ToolError> {
        self.record(format!("wallpaper {}", path.display()))?;
        if self.fail_wallpaper.load(Ordering::SeqCst) {
            return Err(Self::failed("wallpaper"));
        }
        Ok(())
    }

    async fn export_colors(&self) -> Result<(), ToolError> {
        self.record("export-colors".to_string())
    }

    async fn theme(&self) -> Result<String, ToolError> {
        self.record("theme".to_string())?;
        let delay = *self.theme_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_theme.load(Ordering::SeqCst) {
            return Err(Self::failed("theme"));
        }
        Ok(self.theme_output.clone())
    }

    async fn color(
        &self,
        value: &str,
        mode: Option<ThemeMode>,
        scheme: Option<&str>,
    ) -> Result<(), ToolError> {
        let mut call = format!("color {value}");
        if let Some(mode) = mode {
            call.push_str(&format!(" --mode {}", mode.as_str()));
        }
        if let Some(scheme) = scheme {
            call.push_str(&format!(" --scheme {scheme}"));
        }
        self.record(call)
    }

    async fn preset_apply(&self, name: &str) -> Result<(), ToolError> {
        self.record(format!("preset apply {name}"))
    }

    async fn presets(&self) -> Result<Vec<String>, ToolError> {
        self.record("presets".to_string())?;
        Ok(vec!["nord".to_string(), "gruvbox".to_string()])
    }
}

/// In-memory application catalog.
pub struct FakeCatalog {
    apps: Vec<AppEntry>,
    launched: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new(names: &[&str]) -> Self {
        let apps = names
            .iter()
            .map(|name| AppEntry {
                id: format!("{}.desktop", name.to_lowercase()),
                name: name.to_string(),
                comment: None,
                exec: name.to_lowercase(),
                icon: None,
                terminal: false,
            })
            .collect();
        Self {
            apps,
            launched: Mutex::new(Vec::new()),
        }
    }

    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppCatalog for FakeCatalog {
    async fn list(&self) -> Vec<AppEntry> {
        self.apps.clone()
    }

    async fn fuzzy_query(&self, query: &str) -> Vec<AppEntry> {
        let index = FuzzyIndex::new(self.apps.iter().cloned(), |a| a.name.clone());
        index
            .search(query, usize::MAX)
            .into_iter()
            .cloned()
            .collect()
    }

    async fn launch(&self, app: &AppEntry) -> anyhow::Result<()> {
        self.launched.lock().unwrap().push(app.id.clone());
        Ok(())
    }
}
