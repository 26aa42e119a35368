use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use super::Session;
use crate::wallpaper::StoreEvent;

/// Absolute path to an existing file.
pub(super) fn wallpaper_path(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        bail!("Not a file: {}", path.display());
    }
    std::path::absolute(path).with_context(|| format!("Invalid path {}", path.display()))
}

pub async fn cmd_random(session: &Session) -> Result<()> {
    let mut store = session.store(false);

    let wallpaper = match store.set_random_wallpaper().await {
        Ok(wallpaper) => wallpaper,
        Err(e) => {
            eprintln!("No wallpapers found in: {}", session.wallpaper_dir().display());
            return Err(e.into());
        }
    };
    store.settle().await;

    println!("{}", wallpaper.path.display());
    if let Some(theme) = store.cached_theme(&wallpaper.path) {
        println!("Theme: {}", theme);
    }
    store.dispose();
    Ok(())
}

pub async fn cmd_set(session: &Session, path: &Path) -> Result<()> {
    let path = wallpaper_path(path)?;
    let mut store = session.store(false);

    store.set_wallpaper_path(&path).await?;
    store.settle().await;

    println!("{}", path.display());
    if let Some(theme) = store.cached_theme(&path) {
        println!("Theme: {}", theme);
    }
    store.dispose();
    Ok(())
}

pub async fn cmd_scan(session: &Session) -> Result<()> {
    let dir = session.wallpaper_dir();
    println!("Scanning {}...", dir.display());

    let mut store = session.store(false);
    let count = store.refresh().await;
    println!("Found {} wallpapers", count);

    store.dispose();
    Ok(())
}

pub async fn cmd_thumbnail(session: &Session, path: &Path, output: Option<&Path>) -> Result<()> {
    let path = wallpaper_path(path)?;
    let mut store = session.store(false);

    let thumb = store.try_thumbnail(&path).await?;
    println!("{}x{}", thumb.width(), thumb.height());

    if let Some(output) = output {
        thumb
            .save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Saved {}", output.display());
    }
    store.dispose();
    Ok(())
}

pub async fn cmd_clear_cache(session: &Session, thumbnails: bool, themes: bool) -> Result<()> {
    let mut store = session.store(false);

    if thumbnails {
        store.clear_thumbnail_cache();
        println!("Cleared thumbnail cache");
    }
    if themes {
        let count = store.theme_cache_len();
        store.clear_theme_cache();
        println!("Cleared {} cached themes", count);
    }
    store.dispose();
    Ok(())
}

pub async fn cmd_watch(session: &Session) -> Result<()> {
    let mut store = session.store(true);
    let count = store.refresh().await;
    println!(
        "Watching {} ({} wallpapers). Ctrl+C to stop.",
        session.wallpaper_dir().display(),
        count
    );

    let mut events = store.subscribe();
    loop {
        let keep_going = tokio::select! {
            more = store.process_next() => more,
            _ = tokio::signal::ctrl_c() => false,
        };
        for event in events.drain() {
            report(&event);
        }
        if !keep_going {
            break;
        }
    }

    store.dispose();
    Ok(())
}

fn report(event: &StoreEvent) {
    match event {
        StoreEvent::WallpapersChanged { count } => println!("Indexed {} wallpapers", count),
        StoreEvent::WallpaperSet(path) => println!("Wallpaper: {}", path.display()),
        StoreEvent::ThemeCached { path, theme } => {
            println!("Theme for {}: {}", path.display(), theme)
        }
        StoreEvent::Error(message) => eprintln!("Error: {}", message),
    }
}
