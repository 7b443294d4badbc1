//! Maximal exchange-legal order amounts from live balances

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::common::errors::{EngineError, Result};
use crate::common::types::{Direction, MarketDataSubscription, MarketDataType, TickerSpec};
use crate::config::types::InstrumentConfig;
use crate::registry::ExchangeEventRegistry;

/// Exchange-imposed constraints for one instrument
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentMetadata {
    /// Minimum increment an order amount must be a multiple of; `None`
    /// means no stepping
    pub amount_step_size: Option<Decimal>,
    /// Decimal places prices and amounts may be expressed at
    pub price_scale: u32,
}

/// Source of per-instrument trading constraints
#[async_trait]
pub trait InstrumentMetadataSource: Send + Sync {
    async fn metadata(&self, spec: &TickerSpec) -> Result<InstrumentMetadata>;
}

/// Metadata source backed by configuration
#[derive(Default)]
pub struct StaticInstrumentCatalog {
    entries: HashMap<TickerSpec, InstrumentMetadata>,
}

impl StaticInstrumentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(instruments: &[InstrumentConfig]) -> Self {
        let entries = instruments
            .iter()
            .map(|instrument| {
                (
                    TickerSpec::new(&instrument.exchange, &instrument.base, &instrument.counter),
                    InstrumentMetadata {
                        amount_step_size: instrument.amount_step_size,
                        price_scale: instrument.price_scale.unwrap_or(0),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn insert(&mut self, spec: TickerSpec, metadata: InstrumentMetadata) {
        self.entries.insert(spec, metadata);
    }
}

#[async_trait]
impl InstrumentMetadataSource for StaticInstrumentCatalog {
    async fn metadata(&self, spec: &TickerSpec) -> Result<InstrumentMetadata> {
        self.entries
            .get(spec)
            .cloned()
            .ok_or_else(|| EngineError::MetadataMissing(spec.to_string()))
    }
}

/// Converts an available balance into a maximal order amount that is
/// legal for the instrument
///
/// BUY sizes from the counter-currency balance divided by the limit
/// price; SELL sizes from the base-currency balance directly. Both are
/// truncated to the instrument's price scale and then down to the
/// nearest multiple of the lot step — never up, so the result can
/// neither exceed the available balance nor violate venue limits.
pub struct MaxTradeAmountCalculator {
    spec: TickerSpec,
    amount_step_size: Option<Decimal>,
    price_scale: u32,
    registry: Arc<ExchangeEventRegistry>,
}

impl MaxTradeAmountCalculator {
    pub async fn new(
        spec: TickerSpec,
        registry: Arc<ExchangeEventRegistry>,
        metadata_source: &dyn InstrumentMetadataSource,
    ) -> Result<Self> {
        let metadata = metadata_source.metadata(&spec).await?;
        Ok(Self {
            spec,
            amount_step_size: metadata.amount_step_size,
            price_scale: metadata.price_scale,
            registry,
        })
    }

    /// Truncate `amount` down to the nearest multiple of the lot step
    ///
    /// Truncation loses at most one step of tradable amount; rounding
    /// up could exceed the available balance, which is unacceptable.
    pub fn adjust_amount_for_lot_size(&self, amount: Decimal) -> Decimal {
        match self.amount_step_size {
            Some(step) => {
                let remainder = amount % step;
                if remainder.is_zero() {
                    amount
                } else {
                    amount - remainder
                }
            }
            None => amount,
        }
    }

    /// The maximal legal order amount for a trade at `limit_price`
    ///
    /// Blocks on the instrument's balance feed for the first update of
    /// the relevant currency; the subscription is released on every
    /// path. Fails with [`EngineError::FeedDisconnected`] if the feed
    /// goes away first — not retried here.
    pub async fn valid_order_amount(
        &self,
        limit_price: Decimal,
        direction: Direction,
    ) -> Result<Decimal> {
        let mut subscription = self.registry.subscribe(MarketDataSubscription::new(
            self.spec.clone(),
            MarketDataType::Balance,
        ));

        let result = match direction {
            Direction::Sell => {
                let available = subscription.first_balance(&self.spec.base).await?.available;
                available.round_dp_with_strategy(self.price_scale, RoundingStrategy::ToZero)
            }
            Direction::Buy => {
                let available = subscription
                    .first_balance(&self.spec.counter)
                    .await?
                    .available;
                (available / limit_price)
                    .round_dp_with_strategy(self.price_scale, RoundingStrategy::ToZero)
            }
        };
        subscription.close();

        let adjusted = self.adjust_amount_for_lot_size(result);
        debug!(
            spec = %self.spec,
            %direction,
            %limit_price,
            raw = %result,
            amount = %adjusted,
            "Computed maximal order amount"
        );
        Ok(adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{Balance, MarketUpdate};
    use crate::registry::LoggingFeedConnector;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio::time::timeout;

    fn spec() -> TickerSpec {
        TickerSpec::new("binance", "BTC", "USDT")
    }

    async fn calculator(
        registry: &Arc<ExchangeEventRegistry>,
        step: Option<Decimal>,
        scale: u32,
    ) -> MaxTradeAmountCalculator {
        let mut catalog = StaticInstrumentCatalog::new();
        catalog.insert(
            spec(),
            InstrumentMetadata {
                amount_step_size: step,
                price_scale: scale,
            },
        );
        MaxTradeAmountCalculator::new(spec(), registry.clone(), &catalog)
            .await
            .expect("metadata present")
    }

    fn publish_balance(registry: &ExchangeEventRegistry, currency: &str, available: Decimal) {
        registry.publish(MarketUpdate::Balance {
            spec: spec(),
            balance: Balance::new(currency, available, available),
        });
    }

    #[tokio::test]
    async fn test_missing_metadata_is_an_error() {
        let registry = Arc::new(ExchangeEventRegistry::new(Arc::new(LoggingFeedConnector)));
        let catalog = StaticInstrumentCatalog::new();
        let result = MaxTradeAmountCalculator::new(spec(), registry, &catalog).await;
        assert!(matches!(result, Err(EngineError::MetadataMissing(_))));
    }

    #[tokio::test]
    async fn test_lot_size_truncates_down() {
        let registry = Arc::new(ExchangeEventRegistry::new(Arc::new(LoggingFeedConnector)));
        let calculator = calculator(&registry, Some(dec!(0.01)), 4).await;
        assert_eq!(calculator.adjust_amount_for_lot_size(dec!(1.2345)), dec!(1.23));
        assert_eq!(calculator.adjust_amount_for_lot_size(dec!(1.23)), dec!(1.23));
        assert_eq!(calculator.adjust_amount_for_lot_size(dec!(0.0099)), dec!(0.00));
    }

    #[tokio::test]
    async fn test_no_step_size_leaves_amount_unchanged() {
        let registry = Arc::new(ExchangeEventRegistry::new(Arc::new(LoggingFeedConnector)));
        let calculator = calculator(&registry, None, 4).await;
        assert_eq!(calculator.adjust_amount_for_lot_size(dec!(1.2345)), dec!(1.2345));
    }

    #[tokio::test]
    async fn test_sell_uses_base_balance_at_price_scale() {
        let registry = Arc::new(ExchangeEventRegistry::new(Arc::new(LoggingFeedConnector)));
        let calculator = calculator(&registry, None, 2).await;

        let task = {
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                // Counter-currency balance first; SELL must ignore it.
                publish_balance(&registry, "USDT", dec!(100000));
                publish_balance(&registry, "BTC", dec!(5.019));
            })
        };

        let amount = timeout(
            Duration::from_secs(2),
            calculator.valid_order_amount(dec!(9000), Direction::Sell),
        )
        .await
        .expect("must not hang")
        .expect("balance arrived");
        assert_eq!(amount, dec!(5.01));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_buy_divides_counter_balance_by_price() {
        let registry = Arc::new(ExchangeEventRegistry::new(Arc::new(LoggingFeedConnector)));
        let calculator = calculator(&registry, None, 2).await;

        let task = {
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                publish_balance(&registry, "USDT", dec!(10000));
            })
        };

        // 10000 / 9000 = 1.111... truncated at scale 2, never rounded up.
        let amount = timeout(
            Duration::from_secs(2),
            calculator.valid_order_amount(dec!(9000), Direction::Buy),
        )
        .await
        .expect("must not hang")
        .expect("balance arrived");
        assert_eq!(amount, dec!(1.11));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_buy_applies_lot_step_after_scaling() {
        let registry = Arc::new(ExchangeEventRegistry::new(Arc::new(LoggingFeedConnector)));
        let calculator = calculator(&registry, Some(dec!(0.25)), 2).await;

        let task = {
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                publish_balance(&registry, "USDT", dec!(10000));
            })
        };

        // Scaled 1.11, then stepped down to the nearest 0.25 multiple.
        let amount = timeout(
            Duration::from_secs(2),
            calculator.valid_order_amount(dec!(9000), Direction::Buy),
        )
        .await
        .expect("must not hang")
        .expect("balance arrived");
        assert_eq!(amount, dec!(1.00));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_feed_teardown_fails_the_calculation() {
        let registry = Arc::new(ExchangeEventRegistry::new(Arc::new(LoggingFeedConnector)));
        let calculator = calculator(&registry, None, 2).await;
        let key = MarketDataSubscription::new(spec(), MarketDataType::Balance);

        let task = {
            let registry = registry.clone();
            let key = key.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                // A balance for the wrong currency, then the feed dies.
                publish_balance(&registry, "BTC", dec!(1));
                registry.feed_down(&key);
            })
        };

        let result = timeout(
            Duration::from_secs(2),
            calculator.valid_order_amount(dec!(9000), Direction::Buy),
        )
        .await
        .expect("must fail, not hang");
        assert!(matches!(result, Err(EngineError::FeedDisconnected(_))));
        task.await.unwrap();
    }
}
