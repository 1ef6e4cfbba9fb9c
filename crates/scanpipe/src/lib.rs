pub mod broadcast;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod storage;
pub mod worker;

pub use broadcast::{JobProgressBroadcaster, JobSnapshot, JobStatus, Requester};
pub use config::{load_config, ServiceConfig, Settings};
pub use error::{ConfigError, Result, ScanpipeError, StorageError, ToolError, WorkerError};
pub use pipeline::{AssemblyStage, PipelineConfig, ScanStage, StageError, StatusReporter};
pub use processor::{CommandRunner, ToolInvocation, ToolOutput, ToolRunner};
pub use worker::{Job, JobRequest, JobSubmitter, Scheduler};
