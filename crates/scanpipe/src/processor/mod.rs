//! External tool invocation.
//!
//! The pipeline never does image work itself; it builds an argument vector,
//! hands it to a [`ToolRunner`] and looks only at whether the program
//! succeeded. Combined output is kept for logs and failure messages.

pub mod command;
pub mod tools;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::error::ToolError;

pub use command::CommandRunner;
pub use tools::{Toolchain, CLEAN_GLOB, CLEAN_PREFIX, INTERMEDIATE_PDF, SCAN_GLOB};

/// A program plus arguments and an optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// What a finished program left behind.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// stdout followed by stderr.
    pub output: String,
}

impl ToolOutput {
    /// First non-empty output line, or "no output".
    pub fn first_line(&self) -> &str {
        self.output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("no output")
    }
}

pub trait ToolRunner: Send + Sync {
    /// Runs the program to completion. Only a failure to start it is an
    /// `Err`; a non-zero exit comes back as `success == false`.
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError>;
}

/// Runs `invocation`, logs it, and turns an unsuccessful exit into an error.
pub fn run_tool(
    runner: &dyn ToolRunner,
    invocation: &ToolInvocation,
) -> Result<ToolOutput, ToolError> {
    info!(command = %invocation, "running tool");

    let output = runner.run(invocation)?;

    debug!(
        program = %invocation.program,
        success = output.success,
        "{}",
        output.first_line()
    );
    trace!(program = %invocation.program, "{}", output.output.trim_end());

    if output.success {
        Ok(output)
    } else {
        Err(ToolError::Failed {
            program: invocation.program.clone(),
            code: output.code,
            first_line: output.first_line().to_string(),
        })
    }
}
