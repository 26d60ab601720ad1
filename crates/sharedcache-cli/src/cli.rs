use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sharedcache")]
#[command(about = "Inspect and exercise the two-tier shared cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./sharedcache.toml if present)
    #[arg(short, long, global = true, env = "SHAREDCACHE_CONFIG")]
    pub config: Option<String>,

    /// Cache namespace
    #[arg(short, long, global = true, default_value = "default")]
    pub namespace: String,

    /// Print Prometheus metrics recorded by the command
    #[arg(long, global = true)]
    pub metrics: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a value (local tier, then Redis)
    Get(GetArgs),
    /// Write a JSON value to both tiers
    Set(SetArgs),
    /// Remove a value from both tiers
    Delete(DeleteArgs),
    /// Show cache mode and Redis reachability
    Health,
    /// Show cache statistics
    Stats,
}

#[derive(clap::Args)]
pub struct GetArgs {
    /// Key within the namespace
    pub key: String,
}

#[derive(clap::Args)]
pub struct SetArgs {
    /// Key within the namespace
    pub key: String,
    /// JSON value (e.g. '{"plan":"pro"}')
    pub value: String,
    /// Time-to-live in milliseconds
    #[arg(long, default_value_t = 60_000)]
    pub ttl_ms: u64,
    /// Local tier bound for this write
    #[arg(long)]
    pub max_entries: Option<usize>,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    /// Key within the namespace
    pub key: String,
}
