//! Two-sided conditional-order processor

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::control::{JobControl, JobSubmitter, NotificationService};
use super::processor::{JobProcessor, ServiceContext};
use super::types::{OneCancelsOtherJob, ThresholdAndJob};
use crate::common::types::Ticker;
use crate::registry::ExchangeEventRegistry;

// Processor states. Trigger claims the REGISTERED -> *_TRIGGERED
// transition atomically, so a racing second tick can never fire twice.
const CREATED: u8 = 0;
const REGISTERED: u8 = 1;
const LOW_TRIGGERED: u8 = 2;
const HIGH_TRIGGERED: u8 = 3;
const STOPPED: u8 = 4;

enum Side {
    Low,
    High,
}

impl Side {
    fn name(&self) -> &'static str {
        match self {
            Side::Low => "low",
            Side::High => "high",
        }
    }

    fn triggered_state(&self) -> u8 {
        match self {
            Side::Low => LOW_TRIGGERED,
            Side::High => HIGH_TRIGGERED,
        }
    }
}

/// Processor for a [`OneCancelsOtherJob`]
///
/// Registers a tick callback on the job's trigger instrument; on each
/// tick compares the bid against the configured thresholds, low before
/// high, with exact decimal comparisons. On trigger it unregisters
/// itself, submits the winning side's sub-job, sends one notification
/// and finishes the job — exactly once, even under concurrent ticks.
pub struct OneCancelsOtherProcessor {
    inner: Arc<Inner>,
}

struct Inner {
    job: OneCancelsOtherJob,
    control: Arc<dyn JobControl>,
    submitter: Arc<dyn JobSubmitter>,
    notifier: Arc<dyn NotificationService>,
    registry: Arc<ExchangeEventRegistry>,
    state: AtomicU8,
}

impl OneCancelsOtherProcessor {
    pub fn new(
        job: OneCancelsOtherJob,
        control: Arc<dyn JobControl>,
        services: &ServiceContext,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                job,
                control,
                submitter: services.job_submitter.clone(),
                notifier: services.notifier.clone(),
                registry: services.registry.clone(),
                state: AtomicU8::new(CREATED),
            }),
        }
    }
}

impl JobProcessor for OneCancelsOtherProcessor {
    fn start(&self) -> bool {
        let Some(id) = self.inner.job.id.clone() else {
            // Ids are assigned at persistence time; a job without one
            // cannot be keyed in the dispatch table.
            warn!("Refusing to start conditional order with no id");
            return false;
        };

        self.inner.state.store(REGISTERED, Ordering::SeqCst);
        let inner = self.inner.clone();
        self.inner.registry.register_ticker(
            self.inner.job.tick_trigger.clone(),
            id,
            Arc::new(move |ticker| inner.on_tick(ticker)),
        );
        true
    }

    fn stop(&self) {
        self.inner.state.store(STOPPED, Ordering::SeqCst);
        self.inner.unregister();
    }
}

impl Inner {
    fn subscriber_id(&self) -> &str {
        self.job.id.as_deref().unwrap_or_default()
    }

    fn unregister(&self) {
        self.registry
            .unregister_ticker(&self.job.tick_trigger, self.subscriber_id());
    }

    fn on_tick(&self, ticker: Ticker) {
        let spec = &self.job.tick_trigger;
        debug!(
            id = self.subscriber_id(),
            exchange = %spec.exchange,
            pair = %spec.pair_name(),
            operation = "OCO",
            low = %self.job.low.as_ref().map(|side| side.threshold.to_string()).unwrap_or_else(|| "-".to_string()),
            bid = %ticker.bid,
            high = %self.job.high.as_ref().map(|side| side.threshold.to_string()).unwrap_or_else(|| "-".to_string()),
            "Evaluating tick"
        );

        if let Some(low) = &self.job.low {
            if ticker.bid <= low.threshold {
                self.trigger(Side::Low, &ticker, low);
                return;
            }
        }
        if let Some(high) = &self.job.high {
            if ticker.bid >= high.threshold {
                self.trigger(Side::High, &ticker, high);
            }
        }
    }

    fn trigger(&self, side: Side, ticker: &Ticker, target: &ThresholdAndJob) {
        if self
            .state
            .compare_exchange(REGISTERED, side.triggered_state(), Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Already triggered or stopped; a late tick changes nothing.
            return;
        }

        // Unregister before submitting so a tick racing in behind this
        // one can never cause a duplicate submission.
        self.unregister();

        let spec = &self.job.tick_trigger;
        info!(
            id = self.subscriber_id(),
            side = side.name(),
            bid = %ticker.bid,
            threshold = %target.threshold,
            "Bid price hit {} threshold; triggering {} action",
            side.name(),
            side.name()
        );
        self.notifier.send_message(&format!(
            "Job [{}] on [{}/{}/{}]: bid price ({}) hit {} threshold ({}). Triggering {} action.",
            self.subscriber_id(),
            spec.exchange,
            spec.base,
            spec.counter,
            ticker.bid,
            side.name(),
            target.threshold,
            side.name()
        ));

        self.submitter.submit_new((*target.job).clone());
        self.control.finish();
    }
}
