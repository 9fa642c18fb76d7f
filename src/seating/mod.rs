pub mod labels;
pub mod selector;

pub use labels::resolve_seat_label;
pub use selector::{select_duo_seats, select_single_seat};
