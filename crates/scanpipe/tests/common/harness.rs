//! Test harness running the real scheduler against scripted tools.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use assert_fs::TempDir;

use scanpipe::worker::crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use scanpipe::{
    Job, JobSnapshot, JobStatus, PipelineConfig, Requester, Scheduler, Settings, StatusReporter,
    ToolError, ToolInvocation, ToolOutput, ToolRunner,
};

/// Upper bound for any wait on the workers.
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Pretends to be scanimage, noteshrink, img2pdf and ocrmypdf: writes the
/// files each would produce, records every call, and fails programs on
/// request.
pub struct ScriptedRunner {
    pages: usize,
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, GateSide>>,
    calls: Mutex<Vec<ToolInvocation>>,
}

/// Runner end of a gate.
struct GateSide {
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Test end of a gate: holds the next call of one program until released.
pub struct Gate {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl Gate {
    /// Waits until the gated program has been called.
    pub fn wait_entered(&self) {
        self.entered
            .recv_timeout(TIMEOUT)
            .expect("gated program was never called");
    }

    pub fn release(&self) {
        self.release.send(()).expect("gated call still waiting");
    }
}

impl ScriptedRunner {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            failing: Mutex::new(HashSet::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self, program: &str) {
        self.failing.lock().unwrap().insert(program.to_string());
    }

    /// Holds the next call of `program` (after it is recorded) until the
    /// returned gate is released. Later calls run freely.
    pub fn gate(&self, program: &str) -> Gate {
        let (entered_tx, entered_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        self.gates.lock().unwrap().insert(
            program.to_string(),
            GateSide {
                entered: entered_tx,
                release: release_rx,
            },
        );
        Gate {
            entered: entered_rx,
            release: release_tx,
        }
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    fn produce(&self, invocation: &ToolInvocation) {
        let args = &invocation.args;
        match invocation.program.as_str() {
            "scanimage" => {
                let dir = invocation.current_dir.as_ref().expect("scan runs in staging dir");
                // Written out of order on purpose; listing order must not matter.
                for page in (1..=self.pages).rev() {
                    std::fs::write(dir.join(format!("out{}.tif", page)), b"tiff").unwrap();
                }
            }
            "noteshrink" => {
                let base = value_after(args, "-b");
                let inputs = args.iter().skip_while(|a| *a != &base).skip(1).count();
                for index in 0..inputs {
                    std::fs::write(format!("{}{:04}.png", base, index), b"png").unwrap();
                }
            }
            "img2pdf" => {
                std::fs::write(value_after(args, "--output"), b"%PDF-1.4 images").unwrap();
            }
            "ocrmypdf" => {
                let output = args.last().expect("ocr output path");
                std::fs::write(output, b"%PDF-1.4 ocr").unwrap();
            }
            other => panic!("unexpected program {}", other),
        }
    }
}

fn value_after(args: &[String], flag: &str) -> String {
    let index = args.iter().position(|a| a == flag).expect("flag present");
    args[index + 1].clone()
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(invocation.clone());

        let gate = self.gates.lock().unwrap().remove(&invocation.program);
        if let Some(gate) = gate {
            gate.entered.send(()).unwrap();
            gate.release
                .recv_timeout(TIMEOUT)
                .expect("gate was never released");
        }

        if self.failing.lock().unwrap().contains(&invocation.program) {
            return Ok(ToolOutput {
                success: false,
                code: Some(1),
                output: format!("{}: simulated failure\n", invocation.program),
            });
        }

        self.produce(invocation);
        Ok(ToolOutput {
            success: true,
            code: Some(0),
            output: String::new(),
        })
    }
}

/// Temp output directory plus a scripted runner.
pub struct TestHarness {
    temp_dir: TempDir,
    pub runner: Arc<ScriptedRunner>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_pages(3)
    }

    pub fn with_pages(pages: usize) -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            runner: Arc::new(ScriptedRunner::new(pages)),
        }
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir().join(name)
    }

    pub fn start(&self) -> Scheduler {
        Scheduler::start(
            PipelineConfig::default(),
            self.runner.clone(),
            StatusReporter::new(),
        )
        .expect("Failed to start scheduler")
    }

    /// A job in the harness directory wired to a fresh requester channel.
    pub fn job(&self, name: &str, settings: Settings) -> (Job, Receiver<Vec<u8>>) {
        let (requester, rx) = Requester::channel(64);
        let job = Job::new(self.dir(), name, settings).with_requester(requester);
        (job, rx)
    }
}

/// Everything delivered so far, decoded.
pub fn drain(rx: &Receiver<Vec<u8>>) -> Vec<JobSnapshot> {
    rx.try_iter()
        .map(|payload| serde_json::from_slice(&payload).expect("valid snapshot JSON"))
        .collect()
}

pub fn transitions(snapshots: &[JobSnapshot]) -> Vec<(JobStatus, String)> {
    snapshots
        .iter()
        .map(|s| (s.status, s.message.clone()))
        .collect()
}

/// Collects deliveries until one carries `message`, returning everything
/// received up to and including it.
pub fn wait_for_message(rx: &Receiver<Vec<u8>>, message: &str) -> Vec<JobSnapshot> {
    let deadline = Instant::now() + TIMEOUT;
    let mut snapshots = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(payload) => {
                let snapshot: JobSnapshot =
                    serde_json::from_slice(&payload).expect("valid snapshot JSON");
                let found = snapshot.message == message;
                snapshots.push(snapshot);
                if found {
                    return snapshots;
                }
            }
            Err(RecvTimeoutError::Timeout) => panic!("no '{}' within {:?}", message, TIMEOUT),
            Err(RecvTimeoutError::Disconnected) => panic!("requester closed before '{}'", message),
        }
    }
}

/// Polls until `path` exists. Returns `false` after [`TIMEOUT`].
pub fn wait_for_file(path: &Path) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while !path.exists() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    true
}
