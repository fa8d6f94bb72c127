//! Bundling TypeScript templates with an external command

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{CompilationJob, Compiler};
use crate::config::CompilerConfig;
use crate::error::TemplateError;

/// Runs an esbuild-compatible bundler as a child process
///
/// The command line is `<program> <args...> <entry> --bundle --outdir=<dir>
/// --format=<format> --platform=<platform> --log-level=warning`. Source maps
/// are not requested.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
    format: String,
    platform: String,
    work_dir: PathBuf,
}

impl CommandCompiler {
    pub fn from_config(config: &CompilerConfig, work_dir: &Path) -> Self {
        debug!(?config, "CommandCompiler::from_config: called");
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            format: config.format.clone(),
            platform: config.platform.clone(),
            work_dir: work_dir.to_path_buf(),
        }
    }

    /// Arguments passed to the program for a job
    pub fn command_args(&self, job: &CompilationJob) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(job.source_path().display().to_string());
        args.push("--bundle".to_string());
        args.push(format!("--outdir={}", job.output_dir().display()));
        args.push(format!("--format={}", self.format));
        args.push(format!("--platform={}", self.platform));
        args.push("--log-level=warning".to_string());
        args
    }
}

#[async_trait]
impl Compiler for CommandCompiler {
    async fn compile(&self, job: &CompilationJob) -> Result<(), TemplateError> {
        debug!(?job, program = %self.program, "CommandCompiler::compile: called");

        let output = Command::new(&self.program)
            .args(self.command_args(job))
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| TemplateError::compilation(job.source_path(), format!("failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            debug!(status = %output.status, "CommandCompiler::compile: bundler failed");
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostics = match stderr.trim() {
                "" => format!("{} exited with {}", self.program, output.status),
                text => text.to_string(),
            };
            return Err(TemplateError::compilation(job.source_path(), diagnostics));
        }

        debug!("CommandCompiler::compile: bundler succeeded");
        Ok(())
    }
}
