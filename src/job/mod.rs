//! Job model and the generic processing lifecycle
//!
//! Jobs are immutable strategy descriptors; processors are the running
//! behavior attached to a job while it is active. The host owns
//! persistence, retry and scheduling — this module defines the
//! contracts it drives: [`JobProcessor`] start/stop, [`JobControl`]
//! finish-exactly-once, and fire-and-forget [`JobSubmitter`] /
//! [`NotificationService`] collaborators.

pub mod control;
pub mod oco;
pub mod processor;
pub mod types;

pub use control::{
    CompletionToken, InMemoryJobSubmitter, JobControl, JobSubmitter, LoggingNotificationService,
    NotificationService,
};
pub use oco::OneCancelsOtherProcessor;
pub use processor::{BoxedJobProcessor, JobProcessor, ProcessorFactoryTable, ServiceContext};
pub use types::{Job, JobKind, LimitOrderJob, OneCancelsOtherJob, ThresholdAndJob};
