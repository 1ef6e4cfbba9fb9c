use std::path::Path;
use std::sync::Arc;

use tracing::info_span;

use crate::broadcast::JobStatus;
use crate::error::StorageError;
use crate::processor::{
    run_tool, Toolchain, ToolRunner, CLEAN_GLOB, INTERMEDIATE_PDF, SCAN_GLOB,
};
use crate::storage::{ordered_files, remove_directory};
use crate::worker::job::Job;

use super::error::StageError;
use super::progress::StatusReporter;

/// Post-scan processing: optional image cleanup, optional PDF assembly with
/// OCR, then removal of the staging directory. The first failing step ends
/// the job.
pub struct AssemblyStage {
    runner: Arc<dyn ToolRunner>,
    toolchain: Toolchain,
    reporter: StatusReporter,
}

impl AssemblyStage {
    pub fn new(runner: Arc<dyn ToolRunner>, toolchain: Toolchain, reporter: StatusReporter) -> Self {
        Self {
            runner,
            toolchain,
            reporter,
        }
    }

    /// Always leaves the job in a terminal state.
    pub fn run(&self, job: &mut Job) {
        let _span = info_span!("assembly", job_id = %job.id, name = %job.name).entered();

        match self.assemble(job) {
            Ok(()) => self.reporter.report(job, JobStatus::Done, "done!"),
            Err(e) => self
                .reporter
                .report(job, JobStatus::Failed, format!("failed: {}", e)),
        }
    }

    fn assemble(&self, job: &mut Job) -> Result<(), StageError> {
        let staging_dir = job.staging_dir();
        let clean = job.settings.clean;
        let produce_pdf = job.settings.produce_pdf;
        let mut pattern = SCAN_GLOB;

        if clean {
            let _step = info_span!("clean_images").entered();
            self.reporter
                .report(job, JobStatus::InProgress, "cleaning images");
            self.clean_images(&staging_dir, pattern)?;
            pattern = CLEAN_GLOB;
        }

        // Without a PDF the staging directory holds the result and is kept.
        if produce_pdf {
            {
                let _step = info_span!("generate_pdf").entered();
                self.reporter
                    .report(job, JobStatus::InProgress, "generating PDF");
                self.generate_pdf(&staging_dir, pattern, &job.output_path())?;
            }

            let _step = info_span!("remove_staging").entered();
            self.reporter
                .report(job, JobStatus::InProgress, "removing temporary files");
            remove_directory(&staging_dir)?;
        }

        Ok(())
    }

    fn clean_images(&self, staging_dir: &Path, pattern: &str) -> Result<(), StageError> {
        let files = staged_files(staging_dir, pattern)?;
        run_tool(self.runner.as_ref(), &self.toolchain.clean(staging_dir, &files))?;
        Ok(())
    }

    fn generate_pdf(
        &self,
        staging_dir: &Path,
        pattern: &str,
        output: &Path,
    ) -> Result<(), StageError> {
        let files = staged_files(staging_dir, pattern)?;
        let pdf_file = staging_dir.join(INTERMEDIATE_PDF);

        run_tool(
            self.runner.as_ref(),
            &self.toolchain.assemble(&pdf_file, &files),
        )?;
        run_tool(self.runner.as_ref(), &self.toolchain.ocr(&pdf_file, output))?;

        Ok(())
    }
}

fn staged_files(
    staging_dir: &Path,
    pattern: &str,
) -> Result<Vec<std::path::PathBuf>, StorageError> {
    let files = ordered_files(staging_dir, pattern)?;
    if files.is_empty() {
        return Err(StorageError::NoStagedFiles(pattern.to_string()));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::ToolError;
    use crate::processor::{ToolInvocation, ToolOutput};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records invocations; fails the named program, succeeds otherwise
    /// without producing files.
    struct RecordingRunner {
        fail_program: Option<&'static str>,
        calls: Mutex<Vec<ToolInvocation>>,
    }

    impl RecordingRunner {
        fn new(fail_program: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                fail_program,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn programs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.program.clone())
                .collect()
        }
    }

    impl ToolRunner for RecordingRunner {
        fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
            self.calls.lock().unwrap().push(invocation.clone());
            let success = self.fail_program != Some(invocation.program.as_str());
            Ok(ToolOutput {
                success,
                code: Some(if success { 0 } else { 1 }),
                output: if success {
                    String::new()
                } else {
                    format!("{}: broken", invocation.program)
                },
            })
        }
    }

    fn staged_job(temp_dir: &TempDir, settings: Settings) -> Job {
        let job = Job::new(temp_dir.path(), "Report", settings);
        std::fs::create_dir_all(job.staging_dir()).unwrap();
        for name in ["out2.tif", "out10.tif", "out1.tif"] {
            std::fs::write(job.staging_dir().join(name), b"page").unwrap();
        }
        for name in ["clean0001.png", "clean0000.png"] {
            std::fs::write(job.staging_dir().join(name), b"page").unwrap();
        }
        job
    }

    #[test]
    fn test_full_assembly() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(None);
        let stage = AssemblyStage::new(runner.clone(), Toolchain::default(), StatusReporter::new());
        let mut job = staged_job(&temp_dir, Settings::default());

        stage.run(&mut job);

        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(job.message(), "done!");
        assert_eq!(runner.programs(), vec!["noteshrink", "img2pdf", "ocrmypdf"]);
        assert!(!job.staging_dir().exists());

        let calls = runner.calls.lock().unwrap();
        let staging = job.staging_dir();
        // Cleanup sees scanned pages in numeric order.
        assert_eq!(
            &calls[0].args[4..],
            &[
                staging.join("out1.tif").display().to_string(),
                staging.join("out2.tif").display().to_string(),
                staging.join("out10.tif").display().to_string(),
            ]
        );
        // Assembly switches to the cleaned set.
        assert_eq!(
            &calls[1].args[2..],
            &[
                staging.join("clean0000.png").display().to_string(),
                staging.join("clean0001.png").display().to_string(),
            ]
        );
        assert_eq!(
            calls[2].args.last().unwrap(),
            &temp_dir.path().join("Report.pdf").display().to_string()
        );
    }

    #[test]
    fn test_without_clean_uses_scanned_pages() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(None);
        let stage = AssemblyStage::new(runner.clone(), Toolchain::default(), StatusReporter::new());
        let settings = Settings {
            clean: false,
            ..Settings::default()
        };
        let mut job = staged_job(&temp_dir, settings);

        stage.run(&mut job);

        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(runner.programs(), vec!["img2pdf", "ocrmypdf"]);
        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].args[2..].iter().all(|a| a.ends_with(".tif")));
        assert_eq!(calls[0].args.len(), 5);
    }

    #[test]
    fn test_without_pdf_keeps_staging() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(None);
        let stage = AssemblyStage::new(runner.clone(), Toolchain::default(), StatusReporter::new());
        let settings = Settings {
            produce_pdf: false,
            ..Settings::default()
        };
        let mut job = staged_job(&temp_dir, settings);

        stage.run(&mut job);

        assert_eq!(job.status(), JobStatus::Done);
        assert_eq!(runner.programs(), vec!["noteshrink"]);
        assert!(job.staging_dir().exists());
    }

    #[test]
    fn test_clean_failure_stops_pipeline() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(Some("noteshrink"));
        let stage = AssemblyStage::new(runner.clone(), Toolchain::default(), StatusReporter::new());
        let mut job = staged_job(&temp_dir, Settings::default());

        stage.run(&mut job);

        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(
            job.message(),
            "failed: noteshrink exited with status 1: noteshrink: broken"
        );
        assert_eq!(runner.programs(), vec!["noteshrink"]);
        assert!(job.staging_dir().exists());
    }

    #[test]
    fn test_ocr_failure_keeps_staging() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(Some("ocrmypdf"));
        let stage = AssemblyStage::new(runner.clone(), Toolchain::default(), StatusReporter::new());
        let mut job = staged_job(&temp_dir, Settings::default());

        stage.run(&mut job);

        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.message().starts_with("failed: ocrmypdf exited"));
        assert_eq!(runner.programs(), vec!["noteshrink", "img2pdf", "ocrmypdf"]);
        assert!(job.staging_dir().exists());
    }

    #[test]
    fn test_missing_pages_fail_without_running_tools() {
        let temp_dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(None);
        let stage = AssemblyStage::new(runner.clone(), Toolchain::default(), StatusReporter::new());
        let mut job = Job::new(temp_dir.path(), "Empty", Settings::default());
        std::fs::create_dir_all(job.staging_dir()).unwrap();

        stage.run(&mut job);

        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.message(), "failed: no staged files matching 'out*.tif'");
        assert!(runner.programs().is_empty());
    }
}
