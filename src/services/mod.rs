pub mod booking;
pub mod cds;
pub mod circuit_breaker;
