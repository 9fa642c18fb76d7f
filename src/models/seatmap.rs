use serde::{Deserialize, Serialize};

use crate::error::SeatmapError;

/// Состояние ячейки схемы зала.
///
/// Коды провайдера переводятся в это перечисление только здесь, в
/// [`SeatState::from_code`]; дальше по коду сырые числа не сравниваются.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SeatState {
    /// Проход / разделитель (код `0`).
    Gap,
    /// Свободное место (код `1`).
    Available,
    /// Занятое место (код `3`).
    Occupied,
    /// Место для людей с ограниченной мобильностью (коды `2` и `11`).
    Prm,
    /// Любой другой код: место есть, но в общую продажу не идёт.
    OtherUnavailable,
}

impl SeatState {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => SeatState::Gap,
            1 => SeatState::Available,
            3 => SeatState::Occupied,
            2 | 11 => SeatState::Prm,
            _ => SeatState::OtherUnavailable,
        }
    }

    pub fn is_gap(self) -> bool {
        self == SeatState::Gap
    }
}

/// Схема зала для одного сеанса: прямоугольная сетка `rows[row][col]`.
///
/// Неизменяема после построения. Запрашивается заново для каждой попытки
/// бронирования и нигде не кешируется.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<Vec<i64>>")]
pub struct Seatmap {
    rows: Vec<Vec<SeatState>>,
    nb_col: usize,
}

impl Seatmap {
    /// Строит схему из сырых кодов провайдера, проверяя прямоугольность.
    pub fn from_rows(raw: Vec<Vec<i64>>) -> Result<Self, SeatmapError> {
        let nb_col = raw.first().map(Vec::len).unwrap_or(0);

        let mut rows = Vec::with_capacity(raw.len());
        for (index, raw_row) in raw.into_iter().enumerate() {
            if raw_row.len() != nb_col {
                return Err(SeatmapError::NotRectangular {
                    row: index,
                    expected: nb_col,
                    found: raw_row.len(),
                });
            }
            rows.push(raw_row.into_iter().map(SeatState::from_code).collect());
        }

        Ok(Self { rows, nb_col })
    }

    pub fn nb_row(&self) -> usize {
        self.rows.len()
    }

    pub fn nb_col(&self) -> usize {
        self.nb_col
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.nb_col == 0
    }

    pub fn state(&self, row: usize, col: usize) -> Result<SeatState, SeatmapError> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .ok_or(SeatmapError::OutOfBounds { row, col })
    }

    pub fn row(&self, row: usize) -> Result<&[SeatState], SeatmapError> {
        self.rows
            .get(row)
            .map(Vec::as_slice)
            .ok_or(SeatmapError::OutOfBounds { row, col: 0 })
    }

    /// Ряд целиком состоит из проходов и не получает буквы.
    pub fn is_row_empty(&self, row: usize) -> Result<bool, SeatmapError> {
        Ok(self.row(row)?.iter().all(|state| state.is_gap()))
    }

    /// Точка, к которой тянется выбор мест: середина сетки.
    pub fn center(&self) -> (usize, usize) {
        (self.nb_row() / 2, self.nb_col / 2)
    }

    /// Обход всех ячеек в порядке «строка за строкой».
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, SeatState)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, states)| {
            states
                .iter()
                .enumerate()
                .map(move |(col, state)| (row, col, *state))
        })
    }
}

impl TryFrom<Vec<Vec<i64>>> for Seatmap {
    type Error = SeatmapError;

    fn try_from(raw: Vec<Vec<i64>>) -> Result<Self, Self::Error> {
        Seatmap::from_rows(raw)
    }
}

/// Настройки нумерации конкретного зала.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenConfiguration {
    pub id: i64,
    /// Ряд 0 — ближайший к экрану.
    #[serde(rename = "seatmapfronttoback")]
    pub seatmap_front_to_back: bool,
    /// Столбец 0 — крайний левый.
    #[serde(rename = "seatmaplefttoright")]
    pub seatmap_left_to_right: bool,
    /// Проходы не занимают номер места.
    #[serde(rename = "seatmapskipmissingseats")]
    pub seatmap_skip_missing_seats: bool,
}
