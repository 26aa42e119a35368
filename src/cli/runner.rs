use anyhow::Result;

use super::{Cli, Commands};
use crate::cli_cmds::*;
use crate::config::Config;

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let wallpaper_dir = cli.dir.unwrap_or_else(|| config.wallpaper_dir());
    let session = Session::open(config, wallpaper_dir);

    let result = match cli.command {
        Commands::Search { provider, query } => {
            cmd_search(&session, provider.as_deref(), &query).await
        }
        Commands::Pick { provider } => cmd_pick(&session, provider.as_deref()).await,
        Commands::Random => cmd_random(&session).await,
        Commands::Set { path } => cmd_set(&session, &path).await,
        Commands::Scan => cmd_scan(&session).await,
        Commands::Theme { path } => cmd_theme(&session, &path).await,
        Commands::Color {
            value,
            mode,
            scheme,
        } => cmd_color(&session, &value, mode.map(Into::into), scheme.as_deref()).await,
        Commands::Preset { name } => cmd_preset(&session, &name).await,
        Commands::Presets => cmd_presets(&session).await,
        Commands::Thumbnail { path, output } => {
            cmd_thumbnail(&session, &path, output.as_deref()).await
        }
        Commands::ClearCache { thumbnails, themes } => {
            // no flag means both
            let both = !thumbnails && !themes;
            cmd_clear_cache(&session, thumbnails || both, themes || both).await
        }
        Commands::Watch => cmd_watch(&session).await,
    };

    session.close().await;
    result
}
