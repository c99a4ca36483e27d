use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub ads: AdsConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default = "default_tracking_topic")]
    pub tracking_topic: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdsConfig {
    #[serde(default = "default_demo_mode")]
    pub default_demo_mode: bool,
    #[serde(default = "default_demo_latency_ms")]
    pub demo_latency_ms: u64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

impl AdsConfig {
    pub fn demo_latency(&self) -> Duration {
        Duration::from_millis(self.demo_latency_ms)
    }
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            default_demo_mode: default_demo_mode(),
            demo_latency_ms: default_demo_latency_ms(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_tracking_topic() -> String { "ads.tracked".to_string() }
fn default_demo_mode() -> bool { true }
fn default_demo_latency_ms() -> u64 { 100 }
fn default_rate_limit() -> i64 { 120 }
fn default_poll_interval() -> u64 { 10 }
fn default_max_attempts() -> u32 { 10 }
fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `FOY_SERVER__PORT=8080` sets `server.port`
            .add_source(config::Environment::with_prefix("FOY").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
