use anyhow::{Context, Result};
use std::path::Path;

use super::store_cmds::wallpaper_path;
use super::Session;
use crate::theme::ThemeMode;

pub async fn cmd_theme(session: &Session, path: &Path) -> Result<()> {
    let path = wallpaper_path(path)?;
    let mut store = session.store(false);

    let theme = store
        .analyze_theme(&path)
        .await
        .context("Theme analysis was cancelled")?;
    println!("{}", theme);
    println!("{}", serde_json::to_string(&theme)?);

    store.dispose();
    Ok(())
}

pub async fn cmd_color(
    session: &Session,
    value: &str,
    mode: Option<ThemeMode>,
    scheme: Option<&str>,
) -> Result<()> {
    let store = session.store(false);
    store.apply_color_theme(value, mode, scheme).await?;
    println!("Applied color {}", value);
    Ok(())
}

pub async fn cmd_preset(session: &Session, name: &str) -> Result<()> {
    let store = session.store(false);
    store.apply_preset(name).await?;
    println!("Applied preset {}", name);
    Ok(())
}

pub async fn cmd_presets(session: &Session) -> Result<()> {
    let store = session.store(false);
    let presets = store.list_presets().await;

    if presets.is_empty() {
        eprintln!("No presets available");
    }
    for preset in presets {
        println!("{}", preset);
    }
    Ok(())
}
