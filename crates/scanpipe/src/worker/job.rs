use std::path::{Path, PathBuf};

use chrono::{Local, Utc};

use crate::broadcast::{JobSnapshot, JobStatus, Requester};
use crate::config::Settings;
use crate::storage::available_name;

/// One scan-to-PDF work item. Owned by exactly one pipeline stage at a time.
#[derive(Debug)]
pub struct Job {
    pub id: String,
    /// Output base name, unique in `dir` when the job was created.
    pub name: String,
    /// Directory that receives the staging directory and the finished PDF.
    pub dir: PathBuf,
    pub settings: Settings,
    status: JobStatus,
    message: String,
    requester: Option<Requester>,
}

impl Job {
    /// Creates a job targeting `dir`. An empty `name` becomes
    /// `"<today> Document"`; a taken name gets the first free ` N` suffix.
    pub fn new<P: AsRef<Path>>(dir: P, name: &str, settings: Settings) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let base = if name.trim().is_empty() {
            default_job_name()
        } else {
            name.to_string()
        };
        let name = available_name(&dir, &base);

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            dir,
            settings,
            status: JobStatus::InProgress,
            message: String::new(),
            requester: None,
        }
    }

    pub fn with_requester(mut self, requester: Requester) -> Self {
        self.requester = Some(requester);
        self
    }

    /// Scratch directory for this job's page images.
    pub fn staging_dir(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// The finished PDF, or the staging directory when no PDF is produced
    /// (the page images are then the result).
    pub fn output_path(&self) -> PathBuf {
        if self.settings.produce_pdf {
            self.dir.join(format!("{}.pdf", self.name))
        } else {
            self.staging_dir()
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn requester(&self) -> Option<&Requester> {
        self.requester.as_ref()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status,
            message: self.message.clone(),
            output: (self.status == JobStatus::Done)
                .then(|| self.output_path().display().to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Moves to `status` with `message`. Refused once the job is terminal.
    pub(crate) fn transition(&mut self, status: JobStatus, message: String) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        self.message = message;
        true
    }

    pub(crate) fn detach_requester(&mut self) {
        self.requester = None;
    }
}

/// `"<YYYY-MM-DD> Document"` in local time.
pub fn default_job_name() -> String {
    format!("{} Document", Local::now().format("%Y-%m-%d"))
}
