//! condor
//!
//! A market-data-driven execution engine for conditional orders: jobs
//! describe two-sided triggers declaratively, the event registry fans a
//! live feed out to them, and processors react by submitting follow-up
//! orders and retiring themselves exactly once.

pub mod common;
pub mod config;
pub mod job;
pub mod registry;
pub mod sizing;

// Re-export commonly used types
pub use common::errors::{EngineError, Result};
pub use common::types::{
    Balance, Direction, MarketDataSubscription, MarketDataType, MarketUpdate, Ticker, TickerSpec,
};
pub use config::types::AppConfig;
pub use registry::{ExchangeEventRegistry, FeedConnector, Subscription, TickerCallback};

// Job framework
pub use job::{
    BoxedJobProcessor, CompletionToken, Job, JobControl, JobKind, JobProcessor, JobSubmitter,
    LimitOrderJob, NotificationService, OneCancelsOtherJob, OneCancelsOtherProcessor,
    ProcessorFactoryTable, ServiceContext, ThresholdAndJob,
};

// Trade sizing
pub use sizing::{InstrumentMetadataSource, MaxTradeAmountCalculator, StaticInstrumentCatalog};
