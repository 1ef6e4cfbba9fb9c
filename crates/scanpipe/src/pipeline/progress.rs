use tracing::{error, info, warn};

use crate::broadcast::{Delivery, JobProgressBroadcaster, JobStatus};
use crate::worker::job::Job;

/// Records status transitions on a job and pushes them out: to the log, to
/// the job's requester if it is still connected, and to the broadcaster.
#[derive(Clone, Default)]
pub struct StatusReporter {
    broadcaster: Option<JobProgressBroadcaster>,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broadcaster(broadcaster: JobProgressBroadcaster) -> Self {
        Self {
            broadcaster: Some(broadcaster),
        }
    }

    pub fn report(&self, job: &mut Job, status: JobStatus, message: impl Into<String>) {
        let message = message.into();
        if !job.transition(status, message.clone()) {
            warn!(
                job_id = %job.id,
                current = %job.status(),
                rejected = %status,
                message = %message,
                "ignoring report for finished job"
            );
            return;
        }

        info!(job_id = %job.id, name = %job.name, status = %status, message = %message, "job report");

        let snapshot = job.snapshot();

        if let Some(requester) = job.requester() {
            match serde_json::to_vec(&snapshot) {
                Ok(payload) => {
                    if requester.deliver(payload) == Delivery::Closed {
                        job.detach_requester();
                    }
                }
                Err(e) => error!(job_id = %job.id, "failed to serialize job snapshot: {}", e),
            }
        }

        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.send(snapshot);
        }
    }
}
