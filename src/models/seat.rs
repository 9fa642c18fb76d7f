use serde::{Deserialize, Serialize};

/// Выбранное место: позиция в сетке и подпись для билета (например `"E_6"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedSeat {
    pub seat_row: usize,
    pub seat_col: usize,
    pub seat_number: String,
}
