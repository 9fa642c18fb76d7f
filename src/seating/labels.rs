//! Подписи мест вида `{БУКВА_РЯДА}_{НОМЕР}`, например `E_6`.

use crate::error::SeatmapError;
use crate::models::{LabelCell, ScreenConfiguration, SeatLabelTable, Seatmap};

/// Переводит позицию в сетке в подпись места.
///
/// Если для зала задана таблица подписей, берётся её значение без изменений.
/// Иначе буква ряда и номер места вычисляются по настройкам зала:
/// - пустые ряды (одни проходы) буквы не получают;
/// - при `seatmap_skip_missing_seats` проходы не занимают номер.
pub fn resolve_seat_label(
    seatmap: &Seatmap,
    screen: &ScreenConfiguration,
    labels: Option<&SeatLabelTable>,
    row: usize,
    col: usize,
) -> Result<String, SeatmapError> {
    // Вне сетки — ошибка в любом случае, даже если таблица шире.
    let state = seatmap.state(row, col)?;

    if let Some(table) = labels {
        return match table.cell(row, col) {
            Some(LabelCell::Seat(label)) => Ok(label.clone()),
            Some(LabelCell::NoSeat) | None => Err(SeatmapError::NoLabel { row, col }),
        };
    }

    if seatmap.is_row_empty(row)? || (screen.seatmap_skip_missing_seats && state.is_gap()) {
        return Err(SeatmapError::NoLabel { row, col });
    }

    let letter = row_letter(seatmap, screen, row)?;
    let number = seat_number(seatmap, screen, row, col)?;
    Ok(format!("{}_{}", letter, number))
}

fn row_letter(
    seatmap: &Seatmap,
    screen: &ScreenConfiguration,
    row: usize,
) -> Result<String, SeatmapError> {
    let preceding = if screen.seatmap_front_to_back {
        0..row
    } else {
        row + 1..seatmap.nb_row()
    };

    let mut index = 0;
    for other in preceding {
        if !seatmap.is_row_empty(other)? {
            index += 1;
        }
    }
    Ok(row_letters(index))
}

fn seat_number(
    seatmap: &Seatmap,
    screen: &ScreenConfiguration,
    row: usize,
    col: usize,
) -> Result<usize, SeatmapError> {
    let cells = seatmap.row(row)?;
    let counted = if screen.seatmap_left_to_right {
        &cells[..=col]
    } else {
        &cells[col..]
    };

    if screen.seatmap_skip_missing_seats {
        Ok(counted.iter().filter(|state| !state.is_gap()).count())
    } else {
        Ok(counted.len())
    }
}

/// 0 → `A`, 25 → `Z`, 26 → `AA`.
fn row_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}
