use std::path::{Path, PathBuf};

use crate::config::{Settings, ToolsConfig};

use super::ToolInvocation;

/// Pages written by the scanner: `out1.tif`, `out2.tif`, ...
pub const SCAN_GLOB: &str = "out*.tif";
/// Basename handed to the cleaner, which appends a page number and `.png`.
pub const CLEAN_PREFIX: &str = "clean";
pub const CLEAN_GLOB: &str = "clean*.png";
/// Image-only PDF inside the staging directory, before OCR.
pub const INTERMEDIATE_PDF: &str = "out.pdf";

/// Builds the invocation for each external step.
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    tools: ToolsConfig,
}

impl Toolchain {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    /// Batch scan into `staging_dir`, one TIFF per page.
    pub fn scan(&self, settings: &Settings, staging_dir: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.tools.scanner)
            .args(["--format=tiff", "--batch"])
            .args(["--source", settings.source.as_str()])
            .args(["--mode", settings.mode.as_str()])
            .args(["--resolution".to_string(), settings.resolution.to_string()])
            .args(["--brightness".to_string(), settings.brightness.to_string()])
            .args(["--contrast".to_string(), settings.contrast.to_string()])
            .args(["--page-height", "0"])
            .current_dir(staging_dir)
    }

    /// Cleanup of `files` into `<staging_dir>/cleanNNNN.png`, skipping the
    /// cleaner's own PDF output.
    pub fn clean(&self, staging_dir: &Path, files: &[PathBuf]) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(&self.tools.cleaner)
            .args(["-c", "true"])
            .arg("-b")
            .path_arg(&staging_dir.join(CLEAN_PREFIX));
        for file in files {
            invocation = invocation.path_arg(file);
        }
        invocation
    }

    /// Image-only PDF from `files`, in the given order.
    pub fn assemble(&self, pdf_file: &Path, files: &[PathBuf]) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(&self.tools.assembler)
            .arg("--output")
            .path_arg(pdf_file);
        for file in files {
            invocation = invocation.path_arg(file);
        }
        invocation
    }

    /// OCR pass producing the final document.
    pub fn ocr(&self, pdf_file: &Path, output: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.tools.ocr)
            .args(["--rotate-pages", "--clean"])
            .path_arg(pdf_file)
            .path_arg(output)
    }
}
