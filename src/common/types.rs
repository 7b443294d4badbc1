//! Core market-data and instrument types shared across the engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies a tradeable instrument on a named venue
///
/// Equality and hashing are by all three fields; used (together with a
/// subscriber id or a [`MarketDataType`]) as a registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickerSpec {
    /// Venue identifier (e.g. "binance")
    pub exchange: String,
    /// Base currency (the asset being traded)
    pub base: String,
    /// Counter currency (the asset it is priced in)
    pub counter: String,
}

impl TickerSpec {
    pub fn new(
        exchange: impl Into<String>,
        base: impl Into<String>,
        counter: impl Into<String>,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            base: base.into(),
            counter: counter.into(),
        }
    }

    /// The currency pair as "BASE/COUNTER"
    pub fn pair_name(&self) -> String {
        format!("{}/{}", self.base, self.counter)
    }
}

impl std::fmt::Display for TickerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.base, self.counter, self.exchange)
    }
}

/// The kind of market data a subscription delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketDataType {
    Ticker,
    Balance,
    Order,
    OpenOrders,
    Trade,
}

impl std::fmt::Display for MarketDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketDataType::Ticker => write!(f, "ticker"),
            MarketDataType::Balance => write!(f, "balance"),
            MarketDataType::Order => write!(f, "order"),
            MarketDataType::OpenOrders => write!(f, "open_orders"),
            MarketDataType::Trade => write!(f, "trade"),
        }
    }
}

/// The unit of subscription in the event registry: one instrument plus
/// one data type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketDataSubscription {
    pub spec: TickerSpec,
    pub data_type: MarketDataType,
}

impl MarketDataSubscription {
    pub fn new(spec: TickerSpec, data_type: MarketDataType) -> Self {
        Self { spec, data_type }
    }

    /// String key used for deduplication and fan-out addressing
    pub fn key(&self) -> String {
        format!("{}/{}", self.spec, self.data_type)
    }
}

impl std::fmt::Display for MarketDataSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A single market price update for an instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Best bid price
    pub bid: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// Timestamp of this update
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    pub fn new(bid: Decimal, ask: Decimal) -> Self {
        Self {
            bid,
            ask,
            timestamp: Utc::now(),
        }
    }
}

/// A balance update for a single currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Currency code (e.g. "BTC", "USDT")
    pub currency: String,
    /// Amount available for trading
    pub available: Decimal,
    /// Total amount including amounts locked in open orders
    pub total: Decimal,
}

impl Balance {
    pub fn new(currency: impl Into<String>, available: Decimal, total: Decimal) -> Self {
        Self {
            currency: currency.into(),
            available,
            total,
        }
    }
}

/// A single trade execution on the venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution price
    pub price: Decimal,
    /// Trade size
    pub amount: Decimal,
    /// Side of the taker order
    pub direction: Direction,
    /// Timestamp of the trade
    pub timestamp: DateTime<Utc>,
}

/// A snapshot of one of the trader's own orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Venue-assigned order id
    pub order_id: String,
    pub direction: Direction,
    pub limit_price: Decimal,
    /// Amount remaining unfilled
    pub remaining: Decimal,
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Unified market update fanned out by the event registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketUpdate {
    /// Price update for an instrument
    Ticker { spec: TickerSpec, ticker: Ticker },
    /// Balance update; balances arrive per instrument subscription so
    /// the currency may be either side of the pair
    Balance { spec: TickerSpec, balance: Balance },
    /// Public trade execution
    Trade { spec: TickerSpec, trade: Trade },
    /// Own-order update
    Order { spec: TickerSpec, order: OrderSnapshot },
}

impl MarketUpdate {
    /// The instrument this update relates to
    pub fn spec(&self) -> &TickerSpec {
        match self {
            MarketUpdate::Ticker { spec, .. } => spec,
            MarketUpdate::Balance { spec, .. } => spec,
            MarketUpdate::Trade { spec, .. } => spec,
            MarketUpdate::Order { spec, .. } => spec,
        }
    }

    /// The data type this update is addressed under
    pub fn data_type(&self) -> MarketDataType {
        match self {
            MarketUpdate::Ticker { .. } => MarketDataType::Ticker,
            MarketUpdate::Balance { .. } => MarketDataType::Balance,
            MarketUpdate::Trade { .. } => MarketDataType::Trade,
            MarketUpdate::Order { .. } => MarketDataType::Order,
        }
    }

    /// The subscription key this update is routed to
    pub fn subscription(&self) -> MarketDataSubscription {
        MarketDataSubscription::new(self.spec().clone(), self.data_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_subscription_key_format() {
        let spec = TickerSpec::new("binance", "BTC", "USDT");
        let sub = MarketDataSubscription::new(spec, MarketDataType::Balance);
        assert_eq!(sub.key(), "BTC/USDT@binance/balance");
    }

    #[test]
    fn test_ticker_spec_equality_by_fields() {
        let a = TickerSpec::new("binance", "BTC", "USDT");
        let b = TickerSpec::new("binance", "BTC", "USDT");
        let c = TickerSpec::new("kraken", "BTC", "USDT");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_market_update_routing() {
        let spec = TickerSpec::new("binance", "ETH", "USDT");
        let update = MarketUpdate::Ticker {
            spec: spec.clone(),
            ticker: Ticker::new(dec!(3000.5), dec!(3001)),
        };
        assert_eq!(update.data_type(), MarketDataType::Ticker);
        assert_eq!(update.subscription().spec, spec);
    }
}
