pub mod job;
pub mod request;
pub mod scheduler;

pub use job::Job;
pub use request::JobRequest;
pub use scheduler::{JobSubmitter, Scheduler};

// Re-export crossbeam_channel for boundary code holding requester receivers
pub use crossbeam_channel;
