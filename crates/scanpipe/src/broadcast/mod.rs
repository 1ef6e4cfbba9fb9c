//! Status delivery: job snapshots, per-requester channels, and a
//! broadcaster for observers that follow every job.

pub mod job_progress;
pub mod requester;

pub use job_progress::{JobProgressBroadcaster, JobSnapshot, JobStatus};
pub use requester::{Delivery, Requester};
