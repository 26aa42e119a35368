use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::theme::ThemeMode;

#[derive(Parser)]
#[command(name = "frostpick")]
#[command(author = "MrMattias")]
#[command(version)]
#[command(about = "App launcher and wallpaper picker backend with theme caching")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Wallpaper directory
    #[arg(short, long, global = true)]
    pub(crate) dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run one query and print the results
    Search {
        /// Provider to search (apps, wallpapers)
        #[arg(short, long)]
        provider: Option<String>,
        /// Search text; empty lists everything
        #[arg(default_value = "")]
        query: String,
    },
    /// Interactive picker driven by lines on stdin
    ///
    /// Each line is a query. `:tab` switches provider, `:enter` activates the
    /// first result, `:esc` closes, `:random` and `:refresh` act on the
    /// current provider.
    Pick {
        /// Provider to start with
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Set a random wallpaper
    Random,
    /// Set a specific wallpaper
    Set {
        /// Path to wallpaper image
        path: PathBuf,
    },
    /// Rescan the wallpaper directory
    Scan,
    /// Derive and cache the theme of a wallpaper
    Theme {
        /// Path to wallpaper image
        path: PathBuf,
    },
    /// Generate a color theme from a single color
    Color {
        /// Color value, e.g. "#7aa2f7"
        value: String,
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
        /// Scheme name passed to chromash
        #[arg(short, long)]
        scheme: Option<String>,
    },
    /// Apply a named chromash preset
    Preset {
        name: String,
    },
    /// List chromash presets
    Presets,
    /// Build the thumbnail of a wallpaper
    Thumbnail {
        /// Path to wallpaper image
        path: PathBuf,
        /// Write the thumbnail here (format from extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Clear cached thumbnails and themes (both when no flag is given)
    ClearCache {
        #[arg(long)]
        thumbnails: bool,
        #[arg(long)]
        themes: bool,
    },
    /// Keep the wallpaper index live, reacting to directory changes
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum ModeArg {
    Light,
    Dark,
}

impl From<ModeArg> for ThemeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Light => ThemeMode::Light,
            ModeArg::Dark => ThemeMode::Dark,
        }
    }
}
