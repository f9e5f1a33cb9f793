use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "TWOCENTS_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub spam: SpamSettings,
    pub pricing: PricingSettings,
    pub notify: NotifySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct SpamSettings {
    pub akismet_key: Option<String>,
    pub site_url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct PricingSettings {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct NotifySettings {
    pub webhook_url: Option<String>,
    pub queue_capacity: usize,
    pub timeout_secs: u64,
}

impl SpamSettings {
    /// Empty keys from env files count as unset.
    pub fn akismet_key(&self) -> Option<&str> {
        self.akismet_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl NotifySettings {
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n.max(1))
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::build(&run_mode, collect_env_vars(std::env::vars()))
    }

    fn build(run_mode: &str, env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let env_json = serde_json::to_string(&env_map)
            .map_err(|e| ConfigError::Message(format!("Cannot encode env overrides: {}", e)))?;

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/twocents.db")?
            .set_default("database.max_connections", 8)?
            .set_default("database.timeout_secs", 5)?
            .set_default("spam.site_url", "")?
            .set_default("spam.timeout_secs", 5)?
            .set_default("pricing.url", "http://core.2cents.media/post")?
            .set_default("pricing.timeout_secs", 5)?
            .set_default("notify.queue_capacity", 256)?
            .set_default("notify.timeout_secs", 10)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(&env_json, config::FileFormat::Json))
            .build()?;

        s.try_deserialize()
    }
}

/// `TWOCENTS_DATABASE__URL=...` becomes `database.url`.
fn collect_env_vars(vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
