//! Theme properties derived from a wallpaper
//!
//! The primary source is the chromash `theme` output; when the tool is
//! missing or says nothing useful, a filename/time-of-day heuristic takes over.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

mod pipeline;

pub use pipeline::{PipelineState, ThemePipeline, ThemeResponse, ThemeSource};

pub const LIGHT_TONE: u8 = 80;
pub const DARK_TONE: u8 = 20;
pub const VIBRANT_CHROMA: u8 = 40;
pub const NEUTRAL_CHROMA: u8 = 10;

/// Light mode window for the fallback heuristic: [06:00, 18:00)
const DAYTIME_HOURS: std::ops::Range<u32> = 6..18;

const LIGHT_NAME_HINTS: &[&str] = &["light", "day", "bright"];
const DARK_NAME_HINTS: &[&str] = &["dark", "night", "moon"];
const NEUTRAL_NAME_HINTS: &[&str] = &["neutral", "gray", "grey", "mono", "black", "white"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn tone(&self) -> u8 {
        match self {
            ThemeMode::Light => LIGHT_TONE,
            ThemeMode::Dark => DARK_TONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorScheme {
    #[serde(rename = "scheme-neutral", alias = "neutral")]
    Neutral,
    #[serde(rename = "scheme-vibrant", alias = "vibrant")]
    Vibrant,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Neutral => "scheme-neutral",
            ColorScheme::Vibrant => "scheme-vibrant",
        }
    }

    pub fn chroma(&self) -> u8 {
        match self {
            ColorScheme::Neutral => NEUTRAL_CHROMA,
            ColorScheme::Vibrant => VIBRANT_CHROMA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeProperties {
    /// 0-100
    pub tone: u8,
    /// 0-100
    pub chroma: u8,
    pub mode: ThemeMode,
    pub scheme: ColorScheme,
}

impl ThemeProperties {
    pub fn new(mode: ThemeMode, scheme: ColorScheme) -> Self {
        Self {
            tone: mode.tone(),
            chroma: scheme.chroma(),
            mode,
            scheme,
        }
    }
}

impl fmt::Display for ThemeProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (tone {}, chroma {})",
            self.mode.as_str(),
            self.scheme.as_str(),
            self.tone,
            self.chroma
        )
    }
}

/// Theme cache entry, serialized flat as `{tone, chroma, mode, scheme, timestamp}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedThemeEntry {
    #[serde(flatten)]
    pub theme: ThemeProperties,
    /// Derivation time in ms since the epoch; 0 means unknown
    #[serde(default)]
    pub timestamp: u64,
}

/// Persisted theme cache, keyed by absolute image path.
pub type ThemeCacheMap = BTreeMap<String, CachedThemeEntry>;

/// Interpret chromash `theme` output line by line. Later lines win.
/// Returns `None` when no line mentions a mode or a scheme.
pub fn parse_theme_output(output: &str) -> Option<ThemeProperties> {
    let mut mode = None;
    let mut scheme = None;

    for line in output.trim().lines() {
        let line = line.to_lowercase();
        if line.contains("light") {
            mode = Some(ThemeMode::Light);
        } else if line.contains("dark") {
            mode = Some(ThemeMode::Dark);
        }
        if line.contains("neutral") {
            scheme = Some(ColorScheme::Neutral);
        } else if line.contains("vibrant") || line.contains("rainbow") {
            scheme = Some(ColorScheme::Vibrant);
        }
    }

    if mode.is_none() && scheme.is_none() {
        return None;
    }

    Some(ThemeProperties::new(
        mode.unwrap_or(ThemeMode::Dark),
        scheme.unwrap_or(ColorScheme::Vibrant),
    ))
}

/// Deterministic guess from the file name, with the hour of day as tie-breaker.
pub fn fallback_theme(file_name: &str, hour: u32) -> ThemeProperties {
    let name = file_name.to_lowercase();
    let mentions = |hints: &[&str]| hints.iter().any(|h| name.contains(h));

    let mode = if mentions(LIGHT_NAME_HINTS) {
        ThemeMode::Light
    } else if mentions(DARK_NAME_HINTS) {
        ThemeMode::Dark
    } else if DAYTIME_HOURS.contains(&hour) {
        ThemeMode::Light
    } else {
        ThemeMode::Dark
    };

    let scheme = if mentions(NEUTRAL_NAME_HINTS) {
        ColorScheme::Neutral
    } else {
        ColorScheme::Vibrant
    };

    ThemeProperties::new(mode, scheme)
}

/// [`fallback_theme`] for a path at the current local hour.
pub fn fallback_theme_now(path: &Path) -> ThemeProperties {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    fallback_theme(&name, Local::now().hour())
}
