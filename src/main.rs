mod apps;
mod cache;
mod chromash;
mod cli;
mod cli_cmds;
mod config;
mod events;
mod fuzzy;
mod notification;
mod picker;
mod theme;
mod thumbnail;
mod utils;
mod wallpaper;
mod watch;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose {
        "frostpick=debug"
    } else {
        "frostpick=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);
    cli::run(cli).await
}
