use std::process::{Command, Stdio};

use crate::error::ToolError;

use super::{ToolInvocation, ToolOutput, ToolRunner};

/// Runs tools as child processes of this one. No timeout is applied; the
/// calling worker is blocked until the program exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl ToolRunner for CommandRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| ToolError::Spawn {
            program: invocation.program.clone(),
            source: e,
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            output: combined,
        })
    }
}
