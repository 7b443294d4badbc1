//! Immutable job descriptors
//!
//! Jobs are data, never behavior: the host persists them and hands them
//! to a processor built from the [`ProcessorFactoryTable`]. The closed
//! [`JobKind`] tag replaces runtime type lookup and keeps dispatch
//! exhaustiveness compiler-checked.
//!
//! [`ProcessorFactoryTable`]: crate::job::processor::ProcessorFactoryTable

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::types::{Direction, TickerSpec};

/// An immutable strategy descriptor
///
/// The `id` is server-assigned and absent before persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    OneCancelsOther(OneCancelsOtherJob),
    LimitOrder(LimitOrderJob),
}

impl Job {
    pub fn id(&self) -> Option<&str> {
        match self {
            Job::OneCancelsOther(job) => job.id.as_deref(),
            Job::LimitOrder(job) => job.id.as_deref(),
        }
    }

    /// Same descriptor with the server-assigned id set
    pub fn with_id(self, id: impl Into<String>) -> Self {
        match self {
            Job::OneCancelsOther(job) => Job::OneCancelsOther(OneCancelsOtherJob {
                id: Some(id.into()),
                ..job
            }),
            Job::LimitOrder(job) => Job::LimitOrder(LimitOrderJob {
                id: Some(id.into()),
                ..job
            }),
        }
    }

    /// The tag used for processor factory lookup
    pub fn kind(&self) -> JobKind {
        match self {
            Job::OneCancelsOther(_) => JobKind::OneCancelsOther,
            Job::LimitOrder(_) => JobKind::LimitOrder,
        }
    }
}

/// Closed set of strategy tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    OneCancelsOther,
    LimitOrder,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::OneCancelsOther => write!(f, "one_cancels_other"),
            JobKind::LimitOrder => write!(f, "limit_order"),
        }
    }
}

/// One side of a two-sided conditional order: the threshold at which it
/// fires and the job submitted when it does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAndJob {
    pub threshold: Decimal,
    pub job: Box<Job>,
}

impl ThresholdAndJob {
    pub fn new(threshold: Decimal, job: Job) -> Self {
        Self {
            threshold,
            job: Box::new(job),
        }
    }
}

/// A two-sided conditional order
///
/// Watches the trigger instrument's bid price; fires the low side when
/// the bid drops to or below its threshold, the high side when it rises
/// to or above its threshold. Low is evaluated first, so a tick
/// satisfying both resolves low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneCancelsOtherJob {
    #[serde(default)]
    pub id: Option<String>,
    pub tick_trigger: TickerSpec,
    #[serde(default)]
    pub low: Option<ThresholdAndJob>,
    #[serde(default)]
    pub high: Option<ThresholdAndJob>,
}

/// A job which immediately submits a limit order
///
/// Exists mainly so composite strategies like
/// [`OneCancelsOtherJob`] can issue trades transactionally: working out
/// how to make the submission idempotent lives in one place, the
/// processor the host attaches to this descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderJob {
    #[serde(default)]
    pub id: Option<String>,
    pub tick_trigger: TickerSpec,
    pub direction: Direction,
    pub amount: Decimal,
    pub limit_price: Decimal,
}

impl std::fmt::Display for LimitOrderJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} order: {} {} at {} on {}",
            self.direction, self.amount, self.tick_trigger.base, self.limit_price, self.tick_trigger
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_oco() -> Job {
        let spec = TickerSpec::new("binance", "BTC", "USDT");
        Job::OneCancelsOther(OneCancelsOtherJob {
            id: Some("job-1".to_string()),
            tick_trigger: spec.clone(),
            low: Some(ThresholdAndJob::new(
                dec!(9000),
                Job::LimitOrder(LimitOrderJob {
                    id: None,
                    tick_trigger: spec.clone(),
                    direction: Direction::Sell,
                    amount: dec!(0.5),
                    limit_price: dec!(8990),
                }),
            )),
            high: Some(ThresholdAndJob::new(
                dec!(11000),
                Job::LimitOrder(LimitOrderJob {
                    id: None,
                    tick_trigger: spec,
                    direction: Direction::Sell,
                    amount: dec!(0.5),
                    limit_price: dec!(11010),
                }),
            )),
        })
    }

    #[test]
    fn test_job_serde_round_trip() {
        let job = sample_oco();
        let json = serde_json::to_string(&job).expect("serializable");
        assert!(json.contains("\"type\":\"one_cancels_other\""));
        let back: Job = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(job, back);
    }

    #[test]
    fn test_with_id_preserves_payload() {
        let job = sample_oco();
        let assigned = job.clone().with_id("job-2");
        assert_eq!(assigned.id(), Some("job-2"));
        assert_eq!(assigned.kind(), job.kind());
    }

    #[test]
    fn test_limit_order_description() {
        let job = LimitOrderJob {
            id: None,
            tick_trigger: TickerSpec::new("binance", "BTC", "USDT"),
            direction: Direction::Buy,
            amount: dec!(0.25),
            limit_price: dec!(9500),
        };
        assert_eq!(job.to_string(), "BUY order: 0.25 BTC at 9500 on BTC/USDT@binance");
    }
}
