pub mod seatmap;
pub mod labels;
pub mod seat;
pub mod show;
pub mod transaction;

pub use seatmap::{Seatmap, SeatState, ScreenConfiguration};
pub use labels::{LabelCell, SeatLabelTable};
pub use seat::SelectedSeat;
pub use show::{Cinema, IdObject, Media, PaymentType, Show, Tariff, VoucherType};
pub use transaction::Ticket;
