use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use sharedcache::{CacheKey, SetOptions, SharedCache, Ttl};

use crate::cli::{DeleteArgs, GetArgs, SetArgs};
use crate::output::{print_field, print_miss, print_success, print_value};

pub async fn get(cache: &SharedCache, namespace: &str, args: &GetArgs) -> Result<()> {
    let key = CacheKey::new(namespace, &args.key);
    match cache.get::<Value>(namespace, &args.key).await {
        Some(value) => print_value(&value),
        None => print_miss(&format!("{key} not cached")),
    }
    Ok(())
}

pub async fn set(cache: &SharedCache, namespace: &str, args: &SetArgs) -> Result<()> {
    let value: Value = serde_json::from_str(&args.value).context("value must be valid JSON")?;
    if args.ttl_ms == 0 {
        anyhow::bail!("--ttl-ms must be > 0");
    }

    let mut options = SetOptions::new();
    if let Some(max) = args.max_entries {
        options = options.with_max_entries(max);
    }

    let ttl = Ttl::from_millis(args.ttl_ms);
    cache.set(namespace, &args.key, &value, ttl, options).await;
    print_success(&format!(
        "Set {} (ttl {}ms, remote {}s)",
        CacheKey::new(namespace, &args.key),
        ttl.as_millis(),
        ttl.remote_secs()
    ));
    Ok(())
}

pub async fn delete(cache: &SharedCache, namespace: &str, args: &DeleteArgs) -> Result<()> {
    cache.delete(namespace, &args.key).await;
    print_success(&format!("Deleted {}", CacheKey::new(namespace, &args.key)));
    Ok(())
}

pub async fn health(cache: &SharedCache) -> Result<()> {
    let stats = cache.stats().await;
    print_field("Mode", &stats.mode);

    if stats.mode == "local" {
        print_field("Redis", "not configured".yellow());
        return Ok(());
    }

    if cache.is_remote_available().await {
        print_field("Redis", "reachable".green());
        Ok(())
    } else {
        print_field("Redis", "unreachable".red());
        anyhow::bail!("Redis is configured but did not answer PING")
    }
}

pub async fn stats(cache: &SharedCache) -> Result<()> {
    let stats = cache.stats().await;
    print_field("Mode", &stats.mode);
    print_field("Local entries", stats.local_entries);
    print_field("In flight", stats.in_flight);
    Ok(())
}
