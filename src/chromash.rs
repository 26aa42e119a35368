//! Wrapper around the chromash color-theme CLI.

use crate::theme::ThemeMode;
use crate::utils::is_executable;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("chromash not found or not executable at {}", .0.display())]
    Unavailable(PathBuf),

    #[error("failed to run chromash {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("chromash {command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// The sub-commands this crate relies on.
#[async_trait]
pub trait ThemeTool: Send + Sync {
    fn is_available(&self) -> bool;

    /// `wallpaper <path>`
    async fn wallpaper(&self, path: &Path) -> Result<(), ToolError>;

    /// `export-colors`
    async fn export_colors(&self) -> Result<(), ToolError>;

    /// `theme`, raw stdout
    async fn theme(&self) -> Result<String, ToolError>;

    /// `color <value> [--mode m] [--scheme s]`
    async fn color(
        &self,
        value: &str,
        mode: Option<ThemeMode>,
        scheme: Option<&str>,
    ) -> Result<(), ToolError>;

    /// `preset apply <name>`
    async fn preset_apply(&self, name: &str) -> Result<(), ToolError>;

    /// `presets`, one name per line
    async fn presets(&self) -> Result<Vec<String>, ToolError>;
}

/// chromash at a fixed path.
#[derive(Debug, Clone)]
pub struct Chromash {
    path: PathBuf,
}

impl Chromash {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run(&self, args: Vec<OsString>) -> Result<String, ToolError> {
        let command = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");

        if !self.is_available() {
            return Err(ToolError::Unavailable(self.path.clone()));
        }

        debug!("Running chromash {}", command);
        let output = Command::new(&self.path)
            .args(&args)
            .kill_on_drop(false)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ThemeTool for Chromash {
    fn is_available(&self) -> bool {
        is_executable(&self.path)
    }

    async fn wallpaper(&self, path: &Path) -> Result<(), ToolError> {
        self.run(vec!["wallpaper".into(), path.as_os_str().to_owned()])
            .await
            .map(drop)
    }

    async fn export_colors(&self) -> Result<(), ToolError> {
        self.run(vec!["export-colors".into()]).await.map(drop)
    }

    async fn theme(&self) -> Result<String, ToolError> {
        self.run(vec!["theme".into()]).await
    }

    async fn color(
        &self,
        value: &str,
        mode: Option<ThemeMode>,
        scheme: Option<&str>,
    ) -> Result<(), ToolError> {
        let mut args: Vec<OsString> = vec!["color".into(), value.into()];
        if let Some(mode) = mode {
            args.push("--mode".into());
            args.push(mode.as_str().into());
        }
        if let Some(scheme) = scheme {
            args.push("--scheme".into());
            args.push(scheme.into());
        }
        self.run(args).await.map(drop)
    }

    async fn preset_apply(&self, name: &str) -> Result<(), ToolError> {
        self.run(vec!["preset".into(), "apply".into(), name.into()])
            .await
            .map(drop)
    }

    async fn presets(&self) -> Result<Vec<String>, ToolError> {
        let output = self.run(vec!["presets".into()]).await?;
        Ok(output
            .trim()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Set the wallpaper and regenerate the exported palette.
pub async fn apply_wallpaper(
    tool: &dyn ThemeTool,
    path: &Path,
    settle: Duration,
) -> Result<(), ToolError> {
    tool.wallpaper(path).await?;
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }
    tool.export_colors().await
}
