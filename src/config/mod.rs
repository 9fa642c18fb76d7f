use config::{ConfigError, Environment, Source};
use serde::Deserialize;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cds: CdsConfig,
    pub redis: RedisConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub rust_log: String,
}

// Доступ к API Cine Digital Service для одного кинотеатра
#[derive(Debug, Clone, Deserialize)]
pub struct CdsConfig {
    pub cinema_id: String,
    pub account_id: String,
    pub api_token: String,
    /// Хост API без схемы и поддомена аккаунта, со слешем в конце.
    pub api_url: String,
    pub request_timeout_seconds: u64,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

impl Config {
    /// Собирает конфигурацию из переменных окружения вида `CDS__ACCOUNT_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let rust_log = std::env::var("RUST_LOG").ok();
        Self::load(
            Environment::default().separator("__").try_parsing(true),
            rust_log,
        )
    }

    /// Значения по умолчанию, поверх которых кладётся `source`.
    pub fn load<S>(source: S, rust_log: Option<String>) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .set_default("app.environment", "development")?
            .set_default("app.rust_log", "cinema_seating=debug")?
            .set_default("cds.api_url", "cineoffice.fr/api/")?
            .set_default("cds.request_timeout_seconds", 14)?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("circuit_breaker.failure_threshold", 5)?
            .set_default("circuit_breaker.timeout_seconds", 60)?
            .add_source(source)
            .set_override_option("app.rust_log", rust_log)?
            .build()?
            .try_deserialize()
    }
}
