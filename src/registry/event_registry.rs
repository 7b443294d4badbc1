//! The process-wide market-data multiplexer

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::feed::FeedConnector;
use super::subscription::Subscription;
use crate::common::types::{MarketDataSubscription, MarketDataType, MarketUpdate, Ticker, TickerSpec};

/// Callback invoked for every tick delivered to a push subscriber
pub type TickerCallback = Arc<dyn Fn(Ticker) + Send + Sync>;

/// Key of the push-dispatch table: one registration per instrument and
/// subscriber id
type PushKey = (TickerSpec, String);

/// One installed push callback
///
/// The sender feeds a dedicated dispatch worker which invokes the
/// callback serially, so a subscriber never sees ticks out of order or
/// interleaved with itself. The active flag is cleared on unregister:
/// an invocation already in progress completes, queued ticks are
/// discarded.
struct PushEntry {
    sender: mpsc::UnboundedSender<Ticker>,
    active: Arc<AtomicBool>,
}

/// Pull-side fan-out state for one subscription key
///
/// One sender per open [`Subscription`]; the map size is the key's
/// reference count. A sender slot of `None` means the feed for this key
/// went down: the handle still holds its reference but its stream has
/// ended.
#[derive(Default)]
struct PullEntry {
    subscribers: HashMap<u64, Option<mpsc::UnboundedSender<MarketUpdate>>>,
}

struct Inner {
    push: HashMap<PushKey, PushEntry>,
    pull: HashMap<MarketDataSubscription, PullEntry>,
    next_subscription_id: u64,
}

/// Shared state behind the registry and its subscription handles
pub(crate) struct RegistryShared {
    inner: Mutex<Inner>,
    connector: Arc<dyn FeedConnector>,
}

/// Single authoritative multiplexer between the raw market-data feed
/// and in-process subscribers
///
/// All table mutations are mutually exclusive behind one mutex; the
/// mutex is only held for map updates and channel sends, never across
/// an `.await` or a callback invocation, so dispatch to different
/// subscribers proceeds concurrently on their worker tasks.
pub struct ExchangeEventRegistry {
    shared: Arc<RegistryShared>,
}

impl ExchangeEventRegistry {
    pub fn new(connector: Arc<dyn FeedConnector>) -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                inner: Mutex::new(Inner {
                    push: HashMap::new(),
                    pull: HashMap::new(),
                    next_subscription_id: 0,
                }),
                connector,
            }),
        }
    }

    /// Install `callback` to be invoked on every tick for `spec`
    ///
    /// Replacing an existing registration for the same (spec,
    /// subscriber id) overwrites it; the superseded callback receives
    /// no further ticks. Registration establishes feed interest in the
    /// instrument's ticker key.
    pub fn register_ticker(
        &self,
        spec: TickerSpec,
        subscriber_id: impl Into<String>,
        callback: TickerCallback,
    ) {
        let subscriber_id = subscriber_id.into();
        let ticker_key = MarketDataSubscription::new(spec.clone(), MarketDataType::Ticker);

        let (tx, mut rx) = mpsc::unbounded_channel::<Ticker>();
        let active = Arc::new(AtomicBool::new(true));

        let worker_active = active.clone();
        tokio::spawn(async move {
            while let Some(ticker) = rx.recv().await {
                if !worker_active.load(Ordering::SeqCst) {
                    break;
                }
                callback(ticker);
            }
        });

        let newly_interested = {
            let mut inner = self.shared.inner.lock().expect("registry lock poisoned");
            let had_interest = inner.has_interest(&ticker_key);
            if let Some(previous) = inner
                .push
                .insert((spec.clone(), subscriber_id.clone()), PushEntry { sender: tx, active })
            {
                previous.active.store(false, Ordering::SeqCst);
                debug!(%spec, %subscriber_id, "Replaced existing ticker registration");
            } else {
                debug!(%spec, %subscriber_id, "Registered ticker callback");
            }
            !had_interest
        };

        if newly_interested {
            self.shared.connector.connect(&ticker_key);
        }
    }

    /// Remove the registration for (spec, subscriber id)
    ///
    /// No-op if absent. A dispatch already in progress completes; no
    /// dispatch begins afterwards.
    pub fn unregister_ticker(&self, spec: &TickerSpec, subscriber_id: &str) {
        let ticker_key = MarketDataSubscription::new(spec.clone(), MarketDataType::Ticker);

        let released_last = {
            let mut inner = self.shared.inner.lock().expect("registry lock poisoned");
            match inner.push.remove(&(spec.clone(), subscriber_id.to_string())) {
                Some(entry) => {
                    entry.active.store(false, Ordering::SeqCst);
                    debug!(%spec, %subscriber_id, "Unregistered ticker callback");
                    !inner.has_interest(&ticker_key)
                }
                None => false,
            }
        };

        if released_last {
            self.shared.connector.disconnect(&ticker_key);
        }
    }

    /// Open (or join) the feed for a subscription key
    ///
    /// Returns a handle exposing a lazy stream of typed updates from
    /// the point of subscription onwards. The handle releases its
    /// reference on drop; the feed for the key is torn down when the
    /// last reference goes.
    pub fn subscribe(&self, subscription: MarketDataSubscription) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel::<MarketUpdate>();

        let (id, newly_interested) = {
            let mut inner = self.shared.inner.lock().expect("registry lock poisoned");
            let had_interest = inner.has_interest(&subscription);
            let id = inner.next_subscription_id;
            inner.next_subscription_id += 1;
            inner
                .pull
                .entry(subscription.clone())
                .or_default()
                .subscribers
                .insert(id, Some(tx));
            (id, !had_interest)
        };

        debug!(key = %subscription, id, "Opened pull subscription");
        if newly_interested {
            self.shared.connector.connect(&subscription);
        }

        Subscription::new(subscription, id, rx, self.shared.clone())
    }

    /// Fan a market update out to every subscriber of its key
    ///
    /// Ticker updates additionally reach the push callbacks registered
    /// for the instrument. Updates for keys nobody is subscribed to are
    /// dropped.
    pub fn publish(&self, update: MarketUpdate) {
        let key = update.subscription();
        let inner = self.shared.inner.lock().expect("registry lock poisoned");

        if let MarketUpdate::Ticker { spec, ticker } = &update {
            for ((entry_spec, subscriber_id), entry) in &inner.push {
                if entry_spec == spec && entry.sender.send(ticker.clone()).is_err() {
                    // Worker already gone; unregister will clean the entry up.
                    trace!(%spec, %subscriber_id, "Dropped tick for departed subscriber");
                }
            }
        }

        if let Some(entry) = inner.pull.get(&key) {
            for sender in entry.subscribers.values().flatten() {
                let _ = sender.send(update.clone());
            }
        }
    }

    /// Signal that the feed for a key has gone away
    ///
    /// Every blocked puller on the key is unblocked with end-of-stream
    /// (surfacing as a failure); push subscribers simply stop receiving
    /// until the feed recovers. Reference counts are unaffected —
    /// handles still own their slot and release it as usual.
    pub fn feed_down(&self, key: &MarketDataSubscription) {
        let mut inner = self.shared.inner.lock().expect("registry lock poisoned");
        if let Some(entry) = inner.pull.get_mut(key) {
            warn!(%key, subscribers = entry.subscribers.len(), "Feed down; closing pull streams");
            for sender in entry.subscribers.values_mut() {
                *sender = None;
            }
        }
    }
}

impl Inner {
    /// Whether any subscriber still establishes feed interest in `key`
    ///
    /// Push registrations count as interest in the instrument's ticker
    /// key.
    fn has_interest(&self, key: &MarketDataSubscription) -> bool {
        if self
            .pull
            .get(key)
            .is_some_and(|entry| !entry.subscribers.is_empty())
        {
            return true;
        }
        key.data_type == MarketDataType::Ticker
            && self.push.keys().any(|(spec, _)| spec == &key.spec)
    }
}

impl RegistryShared {
    /// Release one pull reference; called from the handle's drop
    pub(crate) fn release(&self, key: &MarketDataSubscription, id: u64) {
        let released_last = {
            let mut inner = self.inner.lock().expect("registry lock poisoned");
            let Some(entry) = inner.pull.get_mut(key) else {
                return;
            };
            if entry.subscribers.remove(&id).is_none() {
                return;
            }
            if entry.subscribers.is_empty() {
                inner.pull.remove(key);
            }
            !inner.has_interest(key)
        };

        debug!(%key, id, "Released pull subscription");
        if released_last {
            self.connector.disconnect(key);
        }
    }
}
