//! Выбор мест по схеме зала.
//!
//! Выбор чисто вычислительный: схема не меняется, ничего не резервируется.
//! Окончательно место подтверждает (или отклоняет) сам провайдер при
//! создании транзакции.

use tracing::debug;

use super::labels::resolve_seat_label;
use crate::error::SeatmapError;
use crate::models::{ScreenConfiguration, SeatLabelTable, SeatState, Seatmap, SelectedSeat};

type Position = (usize, usize);

/// Место можно продать: оно свободно, это не место PRM и, если задана
/// таблица подписей, у него есть подпись.
fn is_selectable(seatmap: &Seatmap, labels: Option<&SeatLabelTable>, row: usize, col: usize) -> bool {
    let available = matches!(seatmap.state(row, col), Ok(SeatState::Available));
    available && labels.map_or(true, |table| table.is_seat(row, col))
}

fn squared_distance(a: Position, b: Position) -> usize {
    let dr = a.0.abs_diff(b.0);
    let dc = a.1.abs_diff(b.1);
    dr * dr + dc * dc
}

/// Ближайшая к центру позиция; при равенстве — первая в порядке обхода.
fn closest_to_center(center: Position, candidates: impl IntoIterator<Item = Position>) -> Option<Position> {
    let mut best: Option<(usize, Position)> = None;
    for position in candidates {
        let distance = squared_distance(center, position);
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, position));
        }
    }
    best.map(|(_, position)| position)
}

fn selectable_positions(seatmap: &Seatmap, labels: Option<&SeatLabelTable>) -> Vec<Position> {
    seatmap
        .cells()
        .filter(|&(row, col, _)| is_selectable(seatmap, labels, row, col))
        .map(|(row, col, _)| (row, col))
        .collect()
}

fn to_selected_seat(
    seatmap: &Seatmap,
    screen: &ScreenConfiguration,
    labels: Option<&SeatLabelTable>,
    (row, col): Position,
) -> Result<SelectedSeat, SeatmapError> {
    Ok(SelectedSeat {
        seat_row: row,
        seat_col: col,
        seat_number: resolve_seat_label(seatmap, screen, labels, row, col)?,
    })
}

/// Одно свободное место как можно ближе к центру зала.
///
/// `Ok(None)` — свободных мест нет, это штатная ситуация (аншлаг).
pub fn select_single_seat(
    seatmap: &Seatmap,
    screen: &ScreenConfiguration,
    labels: Option<&SeatLabelTable>,
) -> Result<Option<SelectedSeat>, SeatmapError> {
    let candidates = selectable_positions(seatmap, labels);
    let Some(position) = closest_to_center(seatmap.center(), candidates) else {
        debug!(screen_id = screen.id, "No single seat available");
        return Ok(None);
    };

    to_selected_seat(seatmap, screen, labels, position).map(Some)
}

/// Два места для брони «дуо»: всегда либо ровно два, либо ни одного.
///
/// Сначала ищется пара соседних мест в одном ряду — выигрывает пара, чьё
/// правое (по сетке) место ближе всего к центру. Если соседних пар нет,
/// берутся два отдельных места, ближайших к центру.
pub fn select_duo_seats(
    seatmap: &Seatmap,
    screen: &ScreenConfiguration,
    labels: Option<&SeatLabelTable>,
    is_internet_sale_gauge_active: bool,
) -> Result<Vec<SelectedSeat>, SeatmapError> {
    let center = seatmap.center();
    let mut candidates = selectable_positions(seatmap, labels);

    if candidates.len() < 2 {
        debug!(
            screen_id = screen.id,
            is_internet_sale_gauge_active,
            available = candidates.len(),
            "Not enough seats for a duo booking"
        );
        return Ok(Vec::new());
    }

    let pairs = candidates
        .iter()
        .copied()
        .filter(|&(row, col)| col > 0 && is_selectable(seatmap, labels, row, col - 1));

    let (first, second) = match closest_to_center(center, pairs) {
        Some((row, col)) => ((row, col - 1), (row, col)),
        None => {
            // Соседних мест нет: два отдельных места лучше, чем ничего.
            let Some(first) = closest_to_center(center, candidates.iter().copied()) else {
                return Ok(Vec::new());
            };
            candidates.retain(|&position| position != first);
            let Some(second) = closest_to_center(center, candidates.iter().copied()) else {
                return Ok(Vec::new());
            };
            debug!(
                screen_id = screen.id,
                is_internet_sale_gauge_active,
                "No adjacent seats left, falling back to two separate seats"
            );
            (first, second)
        }
    };

    Ok(vec![
        to_selected_seat(seatmap, screen, labels, first)?,
        to_selected_seat(seatmap, screen, labels, second)?,
    ])
}
