mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;
use sharedcache::SharedCache;
use sharedcache::config::loader::load_config;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).map_err(anyhow::Error::msg)?;
    sharedcache::init_tracing_with_level(&config.logging.level);
    if cli.metrics {
        sharedcache::metrics::init_metrics();
    }

    let cache = SharedCache::new(&config);
    let namespace = &cli.namespace;
    tracing::debug!(namespace = %namespace, "shared cache ready");

    match &cli.command {
        Commands::Get(args) => commands::get(&cache, namespace, args).await?,
        Commands::Set(args) => commands::set(&cache, namespace, args).await?,
        Commands::Delete(args) => commands::delete(&cache, namespace, args).await?,
        Commands::Health => commands::health(&cache).await?,
        Commands::Stats => commands::stats(&cache).await?,
    }

    if cli.metrics {
        if let Some(rendered) = sharedcache::metrics::render_metrics() {
            println!("{rendered}");
        }
    }

    Ok(())
}
