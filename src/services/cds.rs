//! cds.rs
//!
//! Клиент API Cine Digital Service (CDS) для одного кинотеатра.
//!
//! Ключевые компоненты:
//! 1.  **Чтение справочников**: сеансы, фильмы, залы, схема зала, параметры
//!     кинотеатра, типы оплаты и ваучеров. Каждый запрос логируется и
//!     проходит через `CircuitBreaker`.
//! 2.  **Выбор мест**: схема зала запрашивается заново при каждой попытке
//!     бронирования и передаётся в `seating`.
//! 3.  **Транзакции**: создание брони (`transaction/create`) и её отмена
//!     (`transaction/cancel`).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{CdsConfig, CircuitBreakerConfig};
use crate::error::{CdsError, CdsResult};
use crate::models::show::{Cinema, IdObject, Media, PaymentType, Show, VoucherType};
use crate::models::transaction::{
    CancelBookingBody, CreateTransactionBody, CreateTransactionResponse, Payment, TicketSale,
};
use crate::models::{ScreenConfiguration, SeatLabelTable, Seatmap, SelectedSeat, Ticket};
use crate::seating;
use crate::services::circuit_breaker::{CircuitBreaker, CircuitState};

const API_CLIENT: &str = "CineDigitalServiceAPI";
const VOUCHER_PAYMENT_TYPE_CODE: &str = "VCH";
const PASS_CULTURE_VOUCHER_CODE: &str = "PSCULTURE";
const TICKET_ALREADY_CANCELED: &str = "TICKET_ALREADY_CANCELED";

/// Клиент для взаимодействия с API Cine Digital Service.
#[derive(Clone)]
pub struct CineDigitalServiceClient {
    cinema_id: String,
    api_token: String,
    /// `https://{account_id}.{api_url}`, всегда со слешем в конце.
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl CineDigitalServiceClient {
    /// Создает и конфигурирует клиент на основе настроек приложения.
    pub fn from_config(config: &CdsConfig, breaker: &CircuitBreakerConfig) -> CdsResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            cinema_id: config.cinema_id.clone(),
            api_token: config.api_token.clone(),
            base_url: with_trailing_slash(format!("https://{}.{}", config.account_id, config.api_url)),
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                breaker.failure_threshold,
                breaker.timeout_seconds,
            )),
        })
    }

    /// Перенаправляет клиент на другой хост (песочница, тесты).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = with_trailing_slash(base_url.into());
        self
    }

    pub fn cinema_id(&self) -> &str {
        &self.cinema_id
    }

    pub fn circuit_breaker_status(&self) -> (CircuitState, u32) {
        (self.circuit_breaker.state(), self.circuit_breaker.failure_count())
    }

    /// Выполняет запрос, пропуская его через Circuit Breaker.
    async fn execute_with_circuit_breaker<F, T>(&self, operation: F) -> CdsResult<T>
    where
        F: std::future::Future<Output = Result<T, reqwest::Error>>,
    {
        if !self.circuit_breaker.can_execute() {
            warn!("Circuit breaker is OPEN - blocking Cine Digital Service request");
            return Err(CdsError::CircuitOpen);
        }

        match operation.await {
            Ok(result) => {
                self.circuit_breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                error!("Cine Digital Service request failed: {:?}", e);
                self.circuit_breaker.record_failure();
                Err(CdsError::Http(e))
            }
        }
    }

    async fn request(
        &self,
        method: Method,
        resource: &str,
        body: Option<serde_json::Value>,
    ) -> CdsResult<String> {
        let url = format!("{}{}", self.base_url, resource);

        let operation = async {
            let mut request = self
                .http_client
                .request(method.clone(), &url)
                .query(&[("api_token", self.api_token.as_str())]);
            if let Some(body) = &body {
                request = request.json(body);
            }
            request.send().await?.error_for_status()?.text().await
        };
        let response = self.execute_with_circuit_breaker(operation).await?;

        debug!(
            api_client = API_CLIENT,
            method = %format!("{} {}", method, url),
            cinema_id = %self.cinema_id,
            response = %response,
            "[CINEMA] Call to external API"
        );
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str) -> CdsResult<T> {
        let response = self.request(Method::GET, resource, None).await?;
        Ok(serde_json::from_str(&response)?)
    }

    async fn send<B: Serialize>(&self, method: Method, resource: &str, body: &B) -> CdsResult<String> {
        let body = serde_json::to_value(body)?;
        self.request(method, resource, Some(body)).await
    }

    fn not_found(&self, what: impl std::fmt::Display) -> CdsError {
        CdsError::Api(format!(
            "{} not found in Cine Digital Service API for cinemaId={} & url={}",
            what, self.cinema_id, self.base_url
        ))
    }

    // --- Справочники ---

    pub async fn get_show(&self, show_id: i64) -> CdsResult<Show> {
        let shows: Vec<Show> = self.get("shows").await?;
        shows
            .into_iter()
            .find(|show| show.id == show_id)
            .ok_or_else(|| CdsError::ShowNotFound {
                show_id,
                cinema_id: self.cinema_id.clone(),
            })
    }

    pub async fn get_screen(&self, screen_id: i64) -> CdsResult<ScreenConfiguration> {
        let screens: Vec<ScreenConfiguration> = self.get("screens").await?;
        screens
            .into_iter()
            .find(|screen| screen.id == screen_id)
            .ok_or_else(|| self.not_found(format!("Screen #{}", screen_id)))
    }

    /// Текущая схема зала для сеанса. Не кешируется.
    pub async fn get_seatmap(&self, show_id: i64) -> CdsResult<Seatmap> {
        let raw: Vec<Vec<i64>> = self.get(&format!("shows/{}/seatmap", show_id)).await?;
        Ok(Seatmap::from_rows(raw)?)
    }

    pub async fn get_cinema_infos(&self) -> CdsResult<Cinema> {
        let cinemas: Vec<Cinema> = self.get("cinemas").await?;
        cinemas
            .into_iter()
            .find(|cinema| cinema.id == self.cinema_id)
            .ok_or_else(|| self.not_found("Cinema"))
    }

    /// Жёстко заданные подписи мест зала, если они настроены в кинотеатре.
    pub async fn get_hardcoded_seatmap(&self, screen_id: i64) -> CdsResult<Option<SeatLabelTable>> {
        let cinema = self.get_cinema_infos().await?;
        Ok(cinema.hardcoded_seatmap(screen_id)?)
    }

    /// Все фильмы кинотеатра.
    pub async fn get_venue_movies(&self) -> CdsResult<Vec<Media>> {
        self.get("media").await
    }

    pub async fn get_voucher_payment_type(&self) -> CdsResult<PaymentType> {
        let payment_types: Vec<PaymentType> = self.get("paiementtype").await?;
        payment_types
            .into_iter()
            .find(|payment_type| payment_type.internal_code == VOUCHER_PAYMENT_TYPE_CODE)
            .ok_or_else(|| self.not_found("Pass Culture payment type"))
    }

    /// Ваучеры pass Culture, у которых есть тариф.
    pub async fn get_pc_voucher_types(&self) -> CdsResult<Vec<VoucherType>> {
        let voucher_types: Vec<VoucherType> = self.get("vouchertype").await?;
        Ok(voucher_types
            .into_iter()
            .filter(|v| v.code.as_deref() == Some(PASS_CULTURE_VOUCHER_CODE) && v.tariff.is_some())
            .collect())
    }

    /// Самый дешёвый ваучер pass Culture среди тарифов сеанса.
    pub async fn get_voucher_type_for_show(&self, show: &Show) -> CdsResult<Option<VoucherType>> {
        let show_tariffs: Vec<i64> = show.tariff_ids().collect();
        let voucher_types = self.get_pc_voucher_types().await?;

        Ok(voucher_types
            .into_iter()
            .filter(|v| v.tariff.as_ref().is_some_and(|t| show_tariffs.contains(&t.id)))
            .min_by(|a, b| voucher_price(a).total_cmp(&voucher_price(b))))
    }

    // --- Выбор мест ---

    pub async fn get_available_seat(
        &self,
        show: &Show,
        screen: &ScreenConfiguration,
    ) -> CdsResult<Option<SelectedSeat>> {
        let seatmap = self.get_seatmap(show.id).await?;
        let labels = self.get_hardcoded_seatmap(screen.id).await?;
        Ok(seating::select_single_seat(&seatmap, screen, labels.as_ref())?)
    }

    pub async fn get_available_duo_seat(
        &self,
        show: &Show,
        screen: &ScreenConfiguration,
    ) -> CdsResult<Vec<SelectedSeat>> {
        let seatmap = self.get_seatmap(show.id).await?;
        let cinema = self.get_cinema_infos().await?;
        let labels = cinema.hardcoded_seatmap(screen.id)?;
        Ok(seating::select_duo_seats(
            &seatmap,
            screen,
            labels.as_ref(),
            cinema.is_internet_sale_gauge_active,
        )?)
    }

    /// Места под бронь: `None` на каждый билет, если у сеанса нет схемы зала.
    pub async fn select_seats(&self, show: &Show, quantity: usize) -> CdsResult<Vec<Option<SelectedSeat>>> {
        if quantity == 0 {
            return Err(CdsError::NotEnoughSeats { remaining_quantity: 0 });
        }
        if quantity > 2 {
            return Err(CdsError::Api(format!(
                "Only solo and duo bookings are supported, got quantity {}",
                quantity
            )));
        }

        // Без схемы зала наличие мест проверяет сам провайдер.
        if !show.has_seatmap() {
            return Ok(vec![None; quantity]);
        }

        let screen = self.get_screen(show.screen.id).await?;
        let seats: Vec<SelectedSeat> = if quantity == 1 {
            self.get_available_seat(show, &screen).await?.into_iter().collect()
        } else {
            self.get_available_duo_seat(show, &screen).await?
        };

        if seats.len() != quantity {
            info!("No seat available for show {} (quantity={})", show.id, quantity);
            return Err(CdsError::NotEnoughSeats { remaining_quantity: 0 });
        }
        Ok(seats.into_iter().map(Some).collect())
    }

    // --- Транзакции ---

    /// Бронирует `quantity` билетов на сеанс и возвращает штрихкоды.
    pub async fn book_ticket(&self, show_id: i64, quantity: usize) -> CdsResult<Vec<Ticket>> {
        let payment_type = self.get_voucher_payment_type().await?;
        let show = self.get_show(show_id).await?;

        let voucher_type = self
            .get_voucher_type_for_show(&show)
            .await?
            .ok_or_else(|| self.not_found(format!("Pass Culture tariff for show #{}", show.id)))?;
        let (voucher_code, tariff) = match (&voucher_type.code, &voucher_type.tariff) {
            (Some(code), Some(tariff)) => (code.clone(), tariff.clone()),
            _ => return Err(self.not_found(format!("Pass Culture tariff for show #{}", show.id))),
        };

        let seats = self.select_seats(&show, quantity).await?;

        let now = Utc::now().naive_utc();
        let mut ticket_sale_collection = Vec::with_capacity(seats.len());
        let mut payment_collection = Vec::with_capacity(seats.len());
        for (index, seat) in seats.into_iter().enumerate() {
            // CDS ждёт отрицательные временные id: -1, -2, ...
            let id = -(index as i64 + 1);
            ticket_sale_collection.push(TicketSale {
                id,
                cinema_id: self.cinema_id.clone(),
                operation_date: now,
                canceled: false,
                seat_row: seat.as_ref().map(|s| s.seat_row),
                seat_col: seat.as_ref().map(|s| s.seat_col),
                seat_number: seat.map(|s| s.seat_number),
                tariff: IdObject { id: tariff.id },
                show: IdObject { id: show.id },
                disabled_person: false,
                voucher_type: voucher_code.clone(),
            });
            payment_collection.push(Payment {
                id,
                amount: tariff.price,
                payment_type: IdObject { id: payment_type.id },
                voucher_type: IdObject { id: voucher_type.id },
            });
        }

        let body = CreateTransactionBody {
            cinema_id: self.cinema_id.clone(),
            transaction_date: now,
            canceled: false,
            ticket_sale_collection,
            payment_collection,
        };

        let response = self.send(Method::POST, "transaction/create", &body).await?;
        let transaction: CreateTransactionResponse = serde_json::from_str(&response)?;
        info!(
            "Booked {} ticket(s) for show {} (transaction {}, invoice {})",
            transaction.tickets.len(),
            show.id,
            transaction.id,
            transaction.invoice_id
        );

        Ok(transaction.tickets.into_iter().map(Ticket::from).collect())
    }

    /// Отменяет билеты по штрихкодам. Уже отменённые билеты ошибкой не считаются.
    pub async fn cancel_booking(&self, barcodes: &[String]) -> CdsResult<()> {
        let payment_type = self.get_voucher_payment_type().await?;
        let body = CancelBookingBody {
            barcodes: barcodes.to_vec(),
            payment_type_id: payment_type.id,
        };

        let response = self.send(Method::PUT, "transaction/cancel", &body).await?;
        if response.trim().is_empty() {
            return Ok(());
        }

        // Порядок ключей как в ответе провайдера.
        let errors: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&response)?;
        let errors: Vec<(String, String)> = errors
            .into_iter()
            .map(|(barcode, reason)| {
                let reason = reason.as_str().map(str::to_string).unwrap_or_else(|| reason.to_string());
                (barcode, reason)
            })
            .collect();

        if errors.iter().all(|(_, reason)| reason == TICKET_ALREADY_CANCELED) {
            info!("Cancelled {} booking(s) on Cine Digital Service", barcodes.len());
            return Ok(());
        }

        let details: Vec<String> = errors
            .iter()
            .map(|(barcode, reason)| format!("{} : {}", barcode, reason))
            .collect();
        Err(CdsError::Api(format!(
            "Error while canceling bookings :\n{}",
            details.join("\n")
        )))
    }
}

fn voucher_price(voucher_type: &VoucherType) -> f64 {
    voucher_type.tariff.as_ref().map_or(f64::INFINITY, |t| t.price)
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
