use serde::Deserialize;
use std::env;

use tro_booking::DEFAULT_TTL_SECONDS;
use tro_payments::HubtelSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub gateway: HubtelSettings,
    pub business_rules: BusinessRules,
    pub pages: PageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_ttl")]
    pub reservation_ttl_seconds: i64,
}

fn default_ttl() -> i64 {
    DEFAULT_TTL_SECONDS
}

/// Browser destinations for the gateway's return redirect.
#[derive(Debug, Deserialize, Clone)]
pub struct PageConfig {
    pub confirmation_url: String,
    pub error_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("TRO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
