use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SharedCacheConfig {
    /// Remote (L2) tier
    #[serde(default)]
    pub redis: RedisConfig,
    /// Local (L1) tier
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SharedCacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.redis.pool_size == 0 {
            return Err("redis.pool_size must be > 0".into());
        }
        if self.redis.read_timeout_ms == 0 || self.redis.write_timeout_ms == 0 {
            return Err("redis timeouts must be > 0".into());
        }
        if self.local.max_entries == 0 {
            return Err("local.max_entries must be > 0".into());
        }
        if self.local.promotion_ttl_ms == 0 {
            return Err("local.promotion_ttl_ms must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

/// Redis configuration for the shared (L2) tier.
///
/// The remote tier is enabled only when both `url` and `token` are set.
/// Without them the cache runs local-only for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis endpoint (e.g., "redis://cache.internal:6379")
    #[serde(default)]
    pub url: Option<String>,

    /// Credential, applied as the connection password.
    /// Prefer SHAREDCACHE__REDIS__TOKEN over putting it in a file.
    #[serde(default)]
    pub token: Option<String>,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Bound on GET/PING, in milliseconds. Reads sit on the hot path.
    #[serde(default = "default_redis_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Bound on SET/DEL, in milliseconds
    #[serde(default = "default_redis_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_read_timeout_ms() -> u64 {
    100
}

fn default_redis_write_timeout_ms() -> u64 {
    250
}

impl RedisConfig {
    /// Endpoint and credential, if both are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().filter(|s| !s.trim().is_empty())?;
        let token = self.token.as_deref().filter(|s| !s.is_empty())?;
        Some((url, token))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            pool_size: default_redis_pool_size(),
            read_timeout_ms: default_redis_read_timeout_ms(),
            write_timeout_ms: default_redis_write_timeout_ms(),
        }
    }
}

/// Local (L1) tier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Max entries when a write does not pass its own bound
    #[serde(default = "default_local_max_entries")]
    pub max_entries: usize,

    /// TTL given to values promoted from Redis into the local tier.
    /// Independent of the TTL of the original write.
    #[serde(default = "default_promotion_ttl_ms")]
    pub promotion_ttl_ms: u64,
}

fn default_local_max_entries() -> usize {
    10_000
}

fn default_promotion_ttl_ms() -> u64 {
    5_000
}

impl LocalConfig {
    pub fn promotion_ttl(&self) -> Duration {
        Duration::from_millis(self.promotion_ttl_ms)
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            max_entries: default_local_max_entries(),
            promotion_ttl_ms: default_promotion_ttl_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::SharedCacheConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_FILE: &str = "sharedcache.toml";
    pub const ENV_PREFIX: &str = "SHAREDCACHE";

    pub fn load_config(path: Option<&str>) -> Result<SharedCacheConfig, String> {
        // Environment variable overrides, e.g., SHAREDCACHE__REDIS__URL=redis://...
        let env = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .separator("__");
        load_config_with_env(path, env)
    }

    pub(crate) fn load_config_with_env(
        path: Option<&str>,
        env: Environment,
    ) -> Result<SharedCacheConfig, String> {
        let mut builder = Config::builder();
        let file = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));
        if file.exists() {
            builder = builder.add_source(File::from(file));
        }
        builder = builder.add_source(env);
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: SharedCacheConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Environment, Map};
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(loader::ENV_PREFIX)
            .try_parsing(true)
            .separator("__")
            .source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let cfg = SharedCacheConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.redis.credentials().is_none());
        assert_eq!(cfg.redis.read_timeout(), Duration::from_millis(100));
        assert_eq!(cfg.redis.write_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.local.max_entries, 10_000);
        assert_eq!(cfg.local.promotion_ttl(), Duration::from_secs(5));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_credentials_require_both_parts() {
        let mut redis = RedisConfig {
            url: Some("redis://localhost:6379".into()),
            ..RedisConfig::default()
        };
        assert!(redis.credentials().is_none());

        redis.token = Some(String::new());
        assert!(redis.credentials().is_none());

        redis.token = Some("secret".into());
        assert_eq!(
            redis.credentials(),
            Some(("redis://localhost:6379", "secret"))
        );

        redis.url = Some("  ".into());
        assert!(redis.credentials().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = SharedCacheConfig::default();
        cfg.redis.read_timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SharedCacheConfig::default();
        cfg.local.max_entries = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SharedCacheConfig::default();
        cfg.local.promotion_ttl_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SharedCacheConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_load_from_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sharedcache.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[redis]
url = "redis://cache.internal:6379"
read_timeout_ms = 50

[local]
max_entries = 500
"#
        )
        .unwrap();

        let cfg = loader::load_config_with_env(
            path.to_str(),
            env(&[
                ("SHAREDCACHE__REDIS__TOKEN", "s3cret"),
                ("SHAREDCACHE__LOCAL__PROMOTION_TTL_MS", "2000"),
            ]),
        )
        .unwrap();

        assert_eq!(
            cfg.redis.credentials(),
            Some(("redis://cache.internal:6379", "s3cret"))
        );
        assert_eq!(cfg.redis.read_timeout_ms, 50);
        assert_eq!(cfg.redis.write_timeout_ms, 250);
        assert_eq!(cfg.local.max_entries, 500);
        assert_eq!(cfg.local.promotion_ttl_ms, 2000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let cfg =
            loader::load_config_with_env(Some("/nonexistent/sharedcache.toml"), env(&[])).unwrap();
        assert!(cfg.redis.credentials().is_none());
        assert_eq!(cfg.local.max_entries, 10_000);
    }

    #[test]
    fn test_load_rejects_invalid_env() {
        let result = loader::load_config_with_env(
            Some("/nonexistent/sharedcache.toml"),
            env(&[("SHAREDCACHE__LOGGING__LEVEL", "loud")]),
        );
        assert!(result.is_err());
    }
}
