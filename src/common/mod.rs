//! Shared types and error handling

pub mod errors;
pub mod types;

pub use errors::{EngineError, Result};
pub use types::{
    Balance, Direction, MarketDataSubscription, MarketDataType, MarketUpdate, OrderSnapshot,
    Ticker, TickerSpec, Trade,
};
