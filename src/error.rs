use thiserror::Error;

/// Ошибки данных схемы зала. Это всегда ошибка данных или программы,
/// а не «мест нет» — отсутствие мест возвращается как `None` / пустой список.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeatmapError {
    #[error("seatmap is not rectangular: row {row} has {found} cells, expected {expected}")]
    NotRectangular { row: usize, expected: usize, found: usize },

    #[error("seat ({row}, {col}) is outside the seatmap")]
    OutOfBounds { row: usize, col: usize },

    #[error("seat ({row}, {col}) has no label")]
    NoLabel { row: usize, col: usize },
}

/// Ошибки клиента Cine Digital Service.
#[derive(Debug, Error)]
pub enum CdsError {
    /// Сетевая ошибка или неуспешный HTTP-статус. Пробрасывается как есть.
    #[error("Cine Digital Service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Circuit breaker is open - Cine Digital Service temporarily unavailable")]
    CircuitOpen,

    /// Ответ провайдера не разобрался.
    #[error("invalid Cine Digital Service payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Провайдер ответил, но нужных данных нет.
    #[error("{0}")]
    Api(String),

    #[error("Show #{show_id} not found in Cine Digital Service API for cinemaId={cinema_id}")]
    ShowNotFound { show_id: i64, cinema_id: String },

    #[error("Not enough seats available (remaining quantity: {remaining_quantity})")]
    NotEnoughSeats { remaining_quantity: i64 },

    #[error(transparent)]
    Seatmap(#[from] SeatmapError),
}

pub type CdsResult<T> = Result<T, CdsError>;
