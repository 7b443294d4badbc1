//! Scoped, ref-counted handle to a live stream of market updates

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;

use super::event_registry::RegistryShared;
use crate::common::errors::{EngineError, Result};
use crate::common::types::{Balance, MarketDataSubscription, MarketUpdate, Ticker};

/// A scoped acquisition of one subscription key in the registry
///
/// Owns one reference into the registry's pull table and a lazy,
/// unbounded stream of updates for the key, replaying only arrivals
/// from the point of subscription. The reference is released when the
/// handle is dropped (or closed explicitly); the underlying feed is
/// torn down when the last reference for the key goes.
///
/// The blocking helpers suspend the calling task only — no lock is held
/// while waiting — and fail with [`EngineError::FeedDisconnected`]
/// instead of hanging when the feed for the key goes away.
pub struct Subscription {
    key: MarketDataSubscription,
    id: u64,
    receiver: mpsc::UnboundedReceiver<MarketUpdate>,
    shared: Arc<RegistryShared>,
}

impl Subscription {
    pub(crate) fn new(
        key: MarketDataSubscription,
        id: u64,
        receiver: mpsc::UnboundedReceiver<MarketUpdate>,
        shared: Arc<RegistryShared>,
    ) -> Self {
        Self {
            key,
            id,
            receiver,
            shared,
        }
    }

    /// The key this handle is subscribed to
    pub fn key(&self) -> &MarketDataSubscription {
        &self.key
    }

    /// Wait for the next update, or `None` once the feed for the key
    /// has gone away
    pub async fn next_update(&mut self) -> Option<MarketUpdate> {
        self.receiver.recv().await
    }

    /// Block until the first update satisfying `predicate` arrives
    pub async fn first_matching<F>(&mut self, predicate: F) -> Result<MarketUpdate>
    where
        F: Fn(&MarketUpdate) -> bool,
    {
        while let Some(update) = self.next().await {
            if predicate(&update) {
                return Ok(update);
            }
        }
        Err(EngineError::FeedDisconnected(self.key.key()))
    }

    /// Block until the first balance update for `currency` arrives
    pub async fn first_balance(&mut self, currency: &str) -> Result<Balance> {
        let update = self
            .first_matching(|update| {
                matches!(update, MarketUpdate::Balance { balance, .. } if balance.currency == currency)
            })
            .await?;
        match update {
            MarketUpdate::Balance { balance, .. } => Ok(balance),
            _ => unreachable!("predicate only matches balances"),
        }
    }

    /// Block until the first ticker update arrives
    pub async fn first_ticker(&mut self) -> Result<Ticker> {
        let update = self
            .first_matching(|update| matches!(update, MarketUpdate::Ticker { .. }))
            .await?;
        match update {
            MarketUpdate::Ticker { ticker, .. } => Ok(ticker),
            _ => unreachable!("predicate only matches tickers"),
        }
    }

    /// Release the subscription explicitly
    ///
    /// Equivalent to dropping the handle; provided so call sites can
    /// make the release point visible.
    pub fn close(self) {}
}

impl Stream for Subscription {
    type Item = MarketUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shared.release(&self.key, self.id);
    }
}
