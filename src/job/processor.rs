//! Processor lifecycle contract and factory dispatch

use std::collections::HashMap;
use std::sync::Arc;

use super::control::{JobControl, JobSubmitter, NotificationService};
use super::oco::OneCancelsOtherProcessor;
use super::types::{Job, JobKind};
use crate::common::errors::{EngineError, Result};
use crate::registry::ExchangeEventRegistry;

/// The running behavior attached to a job while it is active
///
/// `start` returns whether startup succeeded; `false` means the host
/// must treat the job as failed-to-start without retrying, and nothing
/// was left registered. `stop` is best-effort unregistration and is
/// always safe to call repeatedly or on an already-stopped processor.
pub trait JobProcessor: Send + Sync {
    fn start(&self) -> bool;
    fn stop(&self);
}

/// Boxed processor for dynamic dispatch
pub type BoxedJobProcessor = Box<dyn JobProcessor>;

/// Process-wide services handed to every processor
///
/// Built once at the composition root and passed down explicitly.
pub struct ServiceContext {
    pub registry: Arc<ExchangeEventRegistry>,
    pub job_submitter: Arc<dyn JobSubmitter>,
    pub notifier: Arc<dyn NotificationService>,
}

/// Constructor for one strategy's processor
pub type ProcessorFactory =
    fn(Job, Arc<dyn JobControl>, &ServiceContext) -> Result<BoxedJobProcessor>;

/// Static mapping from job tag to processor constructor
///
/// Populated at startup; lookup failure means the host tried to run a
/// job this build has no strategy for.
pub struct ProcessorFactoryTable {
    factories: HashMap<JobKind, ProcessorFactory>,
}

impl ProcessorFactoryTable {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The table with every built-in strategy registered
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(JobKind::OneCancelsOther, |job, control, services| {
            let Job::OneCancelsOther(job) = job else {
                return Err(EngineError::Job(
                    "factory invoked with mismatched job payload".to_string(),
                ));
            };
            Ok(Box::new(OneCancelsOtherProcessor::new(job, control, services)))
        });
        table
    }

    pub fn register(&mut self, kind: JobKind, factory: ProcessorFactory) {
        self.factories.insert(kind, factory);
    }

    /// Build the processor for `job`
    pub fn create(
        &self,
        job: Job,
        control: Arc<dyn JobControl>,
        services: &ServiceContext,
    ) -> Result<BoxedJobProcessor> {
        let kind = job.kind();
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| EngineError::UnsupportedJob(kind.to_string()))?;
        factory(job, control, services)
    }
}
