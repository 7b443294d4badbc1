//! Outward interface from the registry to per-venue feed plumbing

use tracing::info;

use crate::common::types::MarketDataSubscription;

/// Interface to the venue connectivity layer
///
/// The registry calls `connect` when the first subscriber establishes
/// interest in a key and `disconnect` when the last one releases it.
/// The connectivity layer then starts or stops producing updates for
/// that key via [`ExchangeEventRegistry::publish`].
///
/// Both calls are fire-and-forget and are made outside the registry's
/// lock; implementations must not block — anything slow belongs on a
/// task the implementation spawns itself. Reconnection after a feed
/// failure is also the implementation's responsibility.
///
/// [`ExchangeEventRegistry::publish`]: crate::registry::ExchangeEventRegistry::publish
pub trait FeedConnector: Send + Sync {
    /// Start producing updates for this key
    fn connect(&self, subscription: &MarketDataSubscription);

    /// Stop producing updates for this key
    fn disconnect(&self, subscription: &MarketDataSubscription);
}

/// Connector that only logs transitions
///
/// Useful for wiring up the engine before a real venue connector is
/// attached, and as the default in the binary.
pub struct LoggingFeedConnector;

impl FeedConnector for LoggingFeedConnector {
    fn connect(&self, subscription: &MarketDataSubscription) {
        info!(key = %subscription, "Feed interest opened");
    }

    fn disconnect(&self, subscription: &MarketDataSubscription) {
        info!(key = %subscription, "Feed interest released");
    }
}
