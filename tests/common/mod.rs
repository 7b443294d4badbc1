//! Common test utilities and fixtures

use condor::common::types::{
    Balance, Direction, MarketDataSubscription, MarketDataType, MarketUpdate, Ticker, TickerSpec,
};
use condor::job::{Job, LimitOrderJob, OneCancelsOtherJob, ThresholdAndJob};
use condor::registry::FeedConnector;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Mutex;

/// The instrument most fixtures trade
pub fn btc_usdt() -> TickerSpec {
    TickerSpec::new("binance", "BTC", "USDT")
}

/// A ticker update for the fixture instrument
pub fn tick(bid: Decimal) -> MarketUpdate {
    MarketUpdate::Ticker {
        spec: btc_usdt(),
        ticker: Ticker::new(bid, bid + dec!(1)),
    }
}

/// A balance update for the fixture instrument
pub fn balance(currency: &str, available: Decimal) -> MarketUpdate {
    MarketUpdate::Balance {
        spec: btc_usdt(),
        balance: Balance::new(currency, available, available),
    }
}

/// A sell limit order used as a trigger's sub-job
pub fn sell_order(limit_price: Decimal) -> Job {
    Job::LimitOrder(LimitOrderJob {
        id: None,
        tick_trigger: btc_usdt(),
        direction: Direction::Sell,
        amount: dec!(0.5),
        limit_price,
    })
}

/// A two-sided conditional order around the fixture instrument
pub fn oco_job(id: &str, low: Decimal, high: Decimal) -> OneCancelsOtherJob {
    OneCancelsOtherJob {
        id: Some(id.to_string()),
        tick_trigger: btc_usdt(),
        low: Some(ThresholdAndJob::new(low, sell_order(low))),
        high: Some(ThresholdAndJob::new(high, sell_order(high))),
    }
}

/// Connector tracking net open feed connections per key
#[derive(Default)]
pub struct RecordingConnector {
    open: Mutex<HashMap<String, i64>>,
}

impl RecordingConnector {
    pub fn open_count(&self, key: &MarketDataSubscription) -> i64 {
        *self.open.lock().unwrap().get(&key.key()).unwrap_or(&0)
    }

    pub fn ticker_key() -> MarketDataSubscription {
        MarketDataSubscription::new(btc_usdt(), MarketDataType::Ticker)
    }

    pub fn balance_key() -> MarketDataSubscription {
        MarketDataSubscription::new(btc_usdt(), MarketDataType::Balance)
    }
}

impl FeedConnector for RecordingConnector {
    fn connect(&self, subscription: &MarketDataSubscription) {
        *self
            .open
            .lock()
            .unwrap()
            .entry(subscription.key())
            .or_insert(0) += 1;
    }

    fn disconnect(&self, subscription: &MarketDataSubscription) {
        *self
            .open
            .lock()
            .unwrap()
            .entry(subscription.key())
            .or_insert(0) -= 1;
    }
}
