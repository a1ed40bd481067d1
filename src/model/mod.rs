pub mod candle;
pub mod payload;
pub mod snapshot;
