//! Asynchronous job polling.
//!
//! A reorder submission may hand back a job the backend completes later.
//! The poller waits a fixed interval between status checks and gives up
//! after a bounded number of attempts. Timing out is not a failure: the
//! mutation was accepted, only its completion is unconfirmed, so the
//! caller logs and moves on. There is no cancellation — once submitted,
//! a job cannot be aborted from here.

use std::time::Duration;

use tracing::debug;

use crate::api::CatalogApi;
use crate::types::{CuratorError, JobHandle};

const DEFAULT_MAX_ATTEMPTS: u32 = 30;
const DEFAULT_INTERVAL_MS: u64 = 500;

/// Terminal states of a polled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Backend confirmed completion after `polls` status checks.
    Done { polls: u32 },
    /// Attempt ceiling reached without confirmation.
    TimedOut { attempts: u32 },
}

impl JobStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, JobStatus::Done { .. })
    }
}

/// Bounded fixed-interval poller for backend reorder jobs.
pub struct JobPoller {
    max_attempts: u32,
    interval: Duration,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }
}

impl JobPoller {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Poll until the job reports done or the attempt ceiling is reached.
    ///
    /// Transport/operation errors from the status query propagate — only
    /// the timeout itself is non-fatal.
    pub async fn await_completion(
        &self,
        api: &dyn CatalogApi,
        job: &JobHandle,
    ) -> Result<JobStatus, CuratorError> {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;
            if api.job_done(&job.id).await? {
                debug!(job_id = %job.id, polls = attempt, "Job complete");
                return Ok(JobStatus::Done { polls: attempt });
            }
        }
        Ok(JobStatus::TimedOut {
            attempts: self.max_attempts,
        })
    }
}
