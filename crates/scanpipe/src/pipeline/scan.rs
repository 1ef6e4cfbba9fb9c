use std::sync::Arc;

use tracing::{info_span, warn};

use crate::broadcast::JobStatus;
use crate::processor::{run_tool, Toolchain, ToolRunner};
use crate::storage::{ensure_directory, remove_directory};
use crate::worker::job::Job;

use super::error::StageError;
use super::progress::StatusReporter;

/// Acquisition: scan the job's pages into its staging directory.
pub struct ScanStage {
    runner: Arc<dyn ToolRunner>,
    toolchain: Toolchain,
    reporter: StatusReporter,
}

impl ScanStage {
    pub fn new(runner: Arc<dyn ToolRunner>, toolchain: Toolchain, reporter: StatusReporter) -> Self {
        Self {
            runner,
            toolchain,
            reporter,
        }
    }

    /// Runs the scan and reports the outcome. Returns `true` when the job
    /// should move on to assembly; on failure the job is finished as
    /// `Failed` and its staging directory is gone.
    pub fn run(&self, job: &mut Job) -> bool {
        let _span = info_span!("scan", job_id = %job.id, name = %job.name).entered();

        self.reporter.report(job, JobStatus::InProgress, "scanning");

        match self.scan(job) {
            Ok(()) => {
                self.reporter.report(
                    job,
                    JobStatus::InProgress,
                    "scanning done, queued for processing",
                );
                true
            }
            Err(e) => {
                if let Err(cleanup) = remove_directory(&job.staging_dir()) {
                    warn!(job_id = %job.id, "failed to remove staging directory: {}", cleanup);
                }
                self.reporter
                    .report(job, JobStatus::Failed, format!("scan failed: {}", e));
                false
            }
        }
    }

    fn scan(&self, job: &Job) -> Result<(), StageError> {
        let staging_dir = job.staging_dir();
        ensure_directory(&staging_dir)?;

        let invocation = self.toolchain.scan(&job.settings, &staging_dir);
        run_tool(self.runner.as_ref(), &invocation)?;

        Ok(())
    }
}
