use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, SendError, Sender};
use log::{debug, error, info, warn};

use crate::broadcast::JobStatus;
use crate::error::WorkerError;
use crate::pipeline::{AssemblyStage, PipelineConfig, ScanStage, StatusReporter};
use crate::processor::{Toolchain, ToolRunner};
use crate::storage::remove_directory;
use crate::worker::job::Job;

/// Owns the two stage queues and their worker threads.
///
/// The scan queue is a rendezvous channel: submitting blocks until the scan
/// worker is free to take the job. The assembly queue is bounded with room
/// for `assembly_queue_capacity` scanned jobs, so scanning can run ahead of
/// assembly.
pub struct Scheduler {
    submitter: JobSubmitter,
    workers: Vec<JoinHandle<()>>,
}

/// Cloneable handle for feeding jobs into the scan queue.
#[derive(Clone)]
pub struct JobSubmitter {
    sender: Sender<Job>,
}

impl JobSubmitter {
    /// Hands `job` to the scan worker, blocking while it is busy.
    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        self.sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }
}

impl Scheduler {
    /// Starts one scan worker and one assembly worker.
    pub fn start(
        config: PipelineConfig,
        runner: Arc<dyn ToolRunner>,
        reporter: StatusReporter,
    ) -> Result<Self, WorkerError> {
        let (scan_sender, scan_receiver) = bounded::<Job>(0);
        let (assembly_sender, assembly_receiver) =
            bounded::<Job>(config.assembly_queue_capacity.max(1));

        let toolchain = Toolchain::new(config.tools);
        let scan_stage = ScanStage::new(Arc::clone(&runner), toolchain.clone(), reporter.clone());
        let assembly_stage = AssemblyStage::new(runner, toolchain, reporter.clone());

        let scan_worker = thread::Builder::new()
            .name("scan-worker".to_string())
            .spawn(move || run_scan_worker(scan_stage, scan_receiver, assembly_sender, reporter))
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

        // If this spawn fails the scan worker exits once `scan_sender` drops.
        let assembly_worker = thread::Builder::new()
            .name("assembly-worker".to_string())
            .spawn(move || run_assembly_worker(assembly_stage, assembly_receiver))
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

        info!(
            "Started scan and assembly workers (assembly queue capacity {})",
            config.assembly_queue_capacity
        );

        Ok(Self {
            submitter: JobSubmitter {
                sender: scan_sender,
            },
            workers: vec![scan_worker, assembly_worker],
        })
    }

    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        self.submitter.submit(job)
    }

    pub fn submitter(&self) -> JobSubmitter {
        self.submitter.clone()
    }

    /// Closes the scan queue and waits for both workers to finish the jobs
    /// already queued. Returns once every outstanding [`JobSubmitter`] clone
    /// has been dropped as well.
    pub fn shutdown(self) {
        info!("Shutting down scheduler...");
        drop(self.submitter);

        for worker in self.workers {
            let name = worker.thread().name().unwrap_or("worker").to_string();
            if let Err(e) = worker.join() {
                error!("{} panicked: {:?}", name, e);
            } else {
                debug!("{} finished", name);
            }
        }

        info!("All workers have stopped");
    }
}

fn run_scan_worker(
    stage: ScanStage,
    jobs: Receiver<Job>,
    assembly_queue: Sender<Job>,
    reporter: StatusReporter,
) {
    debug!("Scan worker started");

    for mut job in jobs {
        if !stage.run(&mut job) {
            continue;
        }

        if let Err(SendError(mut job)) = assembly_queue.send(job) {
            error!("Assembly queue closed, dropping job {}", job.id);
            if let Err(e) = remove_directory(&job.staging_dir()) {
                warn!("Failed to remove staging directory of job {}: {}", job.id, e);
            }
            reporter.report(&mut job, JobStatus::Failed, "failed: assembly queue closed");
        }
    }

    debug!("Scan worker stopped");
}

fn run_assembly_worker(stage: AssemblyStage, jobs: Receiver<Job>) {
    debug!("Assembly worker started");

    for mut job in jobs {
        stage.run(&mut job);
    }

    debug!("Assembly worker stopped");
}
