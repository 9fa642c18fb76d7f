use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::show::IdObject;

/// Продажа одного билета внутри транзакции.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketSale {
    pub id: i64,
    #[serde(rename = "cinemaid")]
    pub cinema_id: String,
    #[serde(rename = "operationdate")]
    pub operation_date: NaiveDateTime,
    pub canceled: bool,
    #[serde(rename = "seatrow")]
    pub seat_row: Option<usize>,
    #[serde(rename = "seatcol")]
    pub seat_col: Option<usize>,
    #[serde(rename = "seatnumber")]
    pub seat_number: Option<String>,
    #[serde(rename = "tariffid")]
    pub tariff: IdObject,
    #[serde(rename = "showid")]
    pub show: IdObject,
    #[serde(rename = "disabledperson")]
    pub disabled_person: bool,
    #[serde(rename = "vouchertype")]
    pub voucher_type: String,
}

/// Оплата одного билета ваучером pass Culture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payment {
    pub id: i64,
    pub amount: f64,
    #[serde(rename = "paiementtypeid")]
    pub payment_type: IdObject,
    #[serde(rename = "vouchertypeid")]
    pub voucher_type: IdObject,
}

/// Тело запроса `transaction/create`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTransactionBody {
    #[serde(rename = "cinemaid")]
    pub cinema_id: String,
    #[serde(rename = "transactiondate")]
    pub transaction_date: NaiveDateTime,
    pub canceled: bool,
    #[serde(rename = "ticketsaleCollection")]
    pub ticket_sale_collection: Vec<TicketSale>,
    #[serde(rename = "paiementCollection")]
    pub payment_collection: Vec<Payment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketResponse {
    pub barcode: String,
    #[serde(rename = "seatnumber", default)]
    pub seat_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionResponse {
    pub id: i64,
    #[serde(rename = "invoiceid")]
    pub invoice_id: String,
    pub tickets: Vec<TicketResponse>,
}

/// Тело запроса `transaction/cancel`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelBookingBody {
    pub barcodes: Vec<String>,
    #[serde(rename = "paiementtypeid")]
    pub payment_type_id: i64,
}

/// Билет, выданный провайдером: штрихкод и, если есть схема зала, место.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub barcode: String,
    pub seat_number: Option<String>,
}

impl From<TicketResponse> for Ticket {
    fn from(response: TicketResponse) -> Self {
        Ticket {
            barcode: response.barcode,
            seat_number: response.seat_number,
        }
    }
}
