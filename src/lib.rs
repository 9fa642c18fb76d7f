pub mod config;
pub mod error;
pub mod models;
pub mod redis_client;
pub mod seating;
pub mod services;

use std::sync::Arc;

use services::booking::BookingService;
use services::cds::CineDigitalServiceClient;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub redis: redis_client::RedisClient,
    pub cds: CineDigitalServiceClient,
    pub bookings: BookingService,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let cds = CineDigitalServiceClient::from_config(&config.cds, &config.circuit_breaker)?;
        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        let bookings = BookingService::new(cds.clone(), redis.clone());

        Ok(Arc::new(Self {
            config,
            redis,
            cds,
            bookings,
        }))
    }
}
