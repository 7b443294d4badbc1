//! Collaborator contracts between a running processor and its host

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use super::types::Job;

/// Handle given to a running processor by its host
///
/// `finish` marks the job permanently complete so the host does not
/// resume it. It must be idempotent and safe under concurrent calls:
/// a trigger race must not produce a second terminal side effect.
#[cfg_attr(test, mockall::automock)]
pub trait JobControl: Send + Sync {
    fn finish(&self);
}

/// Acceptance of a new job descriptor into the host's persistence and
/// scheduling layer
///
/// Fire-and-forget: submission failure is the host's concern and is not
/// retried by callers.
#[cfg_attr(test, mockall::automock)]
pub trait JobSubmitter: Send + Sync {
    fn submit_new(&self, job: Job);
}

/// Best-effort outbound alerting
///
/// Failures are logged and ignored; they must never block or fail the
/// triggering job.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationService: Send + Sync {
    fn send_message(&self, message: &str);
}

/// Reference [`JobControl`] with an atomically claimed terminal state
///
/// The first `finish` flips the flag; every later call is a no-op.
#[derive(Default)]
pub struct CompletionToken {
    finished: AtomicBool,
}

impl CompletionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl JobControl for CompletionToken {
    fn finish(&self) {
        if self
            .finished
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            debug!("Job marked finished");
        }
    }
}

/// Submitter that queues accepted jobs in memory
///
/// Stands in for the host's persistence layer in the binary and in
/// tests.
#[derive(Default)]
pub struct InMemoryJobSubmitter {
    accepted: std::sync::Mutex<Vec<Job>>,
}

impl InMemoryJobSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything accepted so far
    pub fn take_accepted(&self) -> Vec<Job> {
        std::mem::take(&mut *self.accepted.lock().expect("submitter lock poisoned"))
    }
}

impl JobSubmitter for InMemoryJobSubmitter {
    fn submit_new(&self, job: Job) {
        debug!(kind = %job.kind(), "Accepted new job");
        self.accepted.lock().expect("submitter lock poisoned").push(job);
    }
}

/// Notification sink that writes to the log
pub struct LoggingNotificationService;

impl NotificationService for LoggingNotificationService {
    fn send_message(&self, message: &str) {
        info!(target: "condor::notifications", "{message}");
    }
}
