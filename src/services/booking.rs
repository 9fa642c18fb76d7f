//! Бронирование через Cine Digital Service с записью выданных штрихкодов в Redis.

use chrono::Utc;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CdsResult;
use crate::models::Ticket;
use crate::redis_client::RedisClient;
use crate::services::cds::CineDigitalServiceClient;

/// Список Redis со всеми штрихкодами, выданными внешними кассами.
pub const EXTERNAL_BOOKINGS_BARCODES_KEY: &str = "api:external_bookings:barcodes";

/// Запись журнала штрихкодов.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeEntry {
    pub barcode: String,
    pub venue_id: i64,
    pub timestamp: i64,
}

impl BarcodeEntry {
    pub fn new(barcode: impl Into<String>, venue_id: i64) -> Self {
        Self {
            barcode: barcode.into(),
            venue_id,
            timestamp: Utc::now().timestamp(),
        }
    }
}

#[derive(Clone)]
pub struct BookingService {
    cds: CineDigitalServiceClient,
    redis: RedisClient,
}

impl BookingService {
    pub fn new(cds: CineDigitalServiceClient, redis: RedisClient) -> Self {
        Self { cds, redis }
    }

    /// Бронирует билеты и дописывает их штрихкоды в журнал.
    /// Ошибка Redis бронь не отменяет.
    pub async fn book_external_ticket(
        &self,
        show_id: i64,
        quantity: usize,
        venue_id: i64,
    ) -> CdsResult<Vec<Ticket>> {
        let tickets = self.cds.book_ticket(show_id, quantity).await?;

        for ticket in &tickets {
            if let Err(e) = self.record_barcode(&BarcodeEntry::new(&ticket.barcode, venue_id)).await {
                warn!(
                    barcode = %ticket.barcode,
                    venue_id,
                    "Could not add external booking barcode to the ledger: {:?}",
                    e
                );
            }
        }

        info!("External booking done: show={} venue={} tickets={}", show_id, venue_id, tickets.len());
        Ok(tickets)
    }

    pub async fn cancel_external_booking(&self, barcodes: &[String]) -> CdsResult<()> {
        self.cds.cancel_booking(barcodes).await
    }

    async fn record_barcode(&self, entry: &BarcodeEntry) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(entry).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        let _: i64 = conn.rpush(EXTERNAL_BOOKINGS_BARCODES_KEY, data).await?;
        Ok(())
    }
}
