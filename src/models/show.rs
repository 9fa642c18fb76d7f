use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use super::labels::{hardcoded_labels_parameter_key, SeatLabelTable};

/// Ссылка на сущность провайдера вида `{"id": 42}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdObject {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShowTariff {
    #[serde(rename = "tariffid")]
    pub tariff: IdObject,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShowMediaOption {
    #[serde(rename = "mediaoptionsid")]
    pub media_options: IdObject,
}

/// Сеанс в формате Cine Digital Service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Show {
    pub id: i64,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(rename = "disableseatmap", default)]
    pub is_disabled_seatmap: bool,
    #[serde(rename = "is_empty_seatmap", default)]
    empty_seatmap_flag: bool,
    /// Схема зала в виде строки; `"[[]]"` у сеансов без схемы.
    #[serde(default)]
    pub seatmap: Option<String>,
    #[serde(default)]
    pub remaining_place: i64,
    #[serde(default)]
    pub internet_remaining_place: i64,
    #[serde(deserialize_with = "deserialize_showtime")]
    pub showtime: DateTime<FixedOffset>,
    #[serde(rename = "showsTariffPostypeCollection", default)]
    pub shows_tariff_pos_type_collection: Vec<ShowTariff>,
    #[serde(rename = "screenid")]
    pub screen: IdObject,
    #[serde(rename = "mediaid")]
    pub media: IdObject,
    #[serde(rename = "showsMediaoptionsCollection", default)]
    pub shows_mediaoptions_collection: Vec<ShowMediaOption>,
}

impl Show {
    pub fn is_empty_seatmap(&self) -> bool {
        self.empty_seatmap_flag
            || self
                .seatmap
                .as_deref()
                .map(|raw| raw.split_whitespace().collect::<String>() == "[[]]")
                .unwrap_or(false)
    }

    /// Места выбираются только если у сеанса есть рабочая схема зала.
    pub fn has_seatmap(&self) -> bool {
        !self.is_disabled_seatmap && !self.is_empty_seatmap()
    }

    pub fn tariff_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.shows_tariff_pos_type_collection.iter().map(|t| t.tariff.id)
    }

    /// Остаток мест: при активной интернет-квоте считается по ней.
    pub fn remaining_quantity(&self, is_internet_sale_gauge_active: bool) -> i64 {
        if is_internet_sale_gauge_active {
            self.internet_remaining_place
        } else {
            self.remaining_place
        }
    }
}

fn deserialize_showtime<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(&raw))
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CinemaParameter {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Информация о кинотеатре, включая его произвольные параметры.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cinema {
    #[serde(deserialize_with = "deserialize_loose_id")]
    pub id: String,
    #[serde(rename = "internetsalegaugeactive", default)]
    pub is_internet_sale_gauge_active: bool,
    #[serde(rename = "cinemaParameters", default)]
    pub cinema_parameters: Vec<CinemaParameter>,
}

impl Cinema {
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.cinema_parameters
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.value.as_deref())
    }

    /// Жёстко заданная разметка зала, если она настроена для этого экрана.
    pub fn hardcoded_seatmap(&self, screen_id: i64) -> Result<Option<SeatLabelTable>, serde_json::Error> {
        match self.parameter(&hardcoded_labels_parameter_key(screen_id)) {
            Some(raw) => SeatLabelTable::parse(raw),
            None => Ok(None),
        }
    }
}

// id кинотеатра приходит то строкой, то числом
fn deserialize_loose_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected cinema id: {}", other))),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentType {
    pub id: i64,
    #[serde(rename = "active", default)]
    pub is_active: bool,
    #[serde(rename = "internalcode")]
    pub internal_code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tariff {
    pub id: i64,
    pub price: f64,
    #[serde(rename = "active", default)]
    pub is_active: bool,
    #[serde(rename = "labeltariff", default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoucherType {
    pub id: i64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(rename = "tariffid", default)]
    pub tariff: Option<Tariff>,
}

/// Фильм из каталога кинотеатра. Номер прокатной визы есть не у всех.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub title: String,
    /// В секундах.
    pub duration: i64,
    #[serde(default)]
    pub storyline: String,
    #[serde(rename = "visanumber", default)]
    pub visa_number: Option<String>,
}
