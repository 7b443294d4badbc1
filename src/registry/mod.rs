//! Event distribution between the market-data feed and in-process
//! subscribers
//!
//! The [`ExchangeEventRegistry`] is the single multiplexer between one
//! raw feed per venue and any number of subscribers. Two access
//! patterns are supported:
//!
//! - **Push**: per-job ticker callbacks, serialized per subscriber so a
//!   callback never observes ticks out of order or concurrently with
//!   itself.
//! - **Pull**: ref-counted [`Subscription`] handles exposing a lazy
//!   stream of typed updates that a caller can block on.

pub mod event_registry;
pub mod feed;
pub mod subscription;

pub use event_registry::{ExchangeEventRegistry, TickerCallback};
pub use feed::{FeedConnector, LoggingFeedConnector};
pub use subscription::Subscription;
