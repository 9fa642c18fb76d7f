use serde::{Deserialize, Deserializer};

/// Префикс параметра кинотеатра с жёстко заданной разметкой зала.
pub const HARDCODED_LABELS_PARAMETER_PREFIX: &str = "SEATMAP_HARDCODED_LABELS_SCREENID_";

pub fn hardcoded_labels_parameter_key(screen_id: i64) -> String {
    format!("{}{}", HARDCODED_LABELS_PARAMETER_PREFIX, screen_id)
}

/// Одна позиция таблицы: подпись места или `0` — места нет.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelCell {
    Seat(String),
    NoSeat,
}

impl<'de> Deserialize<'de> for LabelCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Label(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Label(label) => LabelCell::Seat(label),
            Raw::Number(0) => LabelCell::NoSeat,
            Raw::Number(n) => LabelCell::Seat(n.to_string()),
        })
    }
}

/// Жёстко заданные подписи мест для зала, где вычисленная нумерация
/// не совпадает с реальной.
///
/// Таблица может быть «рваной»: строки разной длины. Позиции, которых в
/// таблице нет, считаются отсутствующими местами.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SeatLabelTable {
    rows: Vec<Vec<LabelCell>>,
}

impl SeatLabelTable {
    /// Разбирает JSON-строку из параметров кинотеатра.
    /// Пустой массив означает «переопределения нет».
    pub fn parse(raw: &str) -> Result<Option<Self>, serde_json::Error> {
        let table: SeatLabelTable = serde_json::from_str(raw)?;
        if table.rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(table))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&LabelCell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn is_seat(&self, row: usize, col: usize) -> bool {
        matches!(self.cell(row, col), Some(LabelCell::Seat(_)))
    }
}
