//! Runner backed by an external download tool

use super::{JobError, JobRunner};
use crate::config::DownloaderConfig;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Invokes `<program> [args...] --output-path <destination> <link>`
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl JobRunner for CommandRunner {
    async fn run(&self, link: &str, destination: &Path) -> Result<String, JobError> {
        debug!(
            program = %self.program,
            link,
            destination = %destination.display(),
            "Launching downloader"
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--output-path")
            .arg(destination)
            .arg(link)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| JobError::Launch {
                program: self.program.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(JobError::Exited {
                status: output.status,
                output: combined,
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_successful_command_returns_combined_output() {
        let dir = TempDir::new().unwrap();
        let runner = CommandRunner::new(
            "sh",
            vec!["-c".to_string(), "echo out; echo err >&2".to_string()],
        );

        let output = runner.run("link", dir.path()).await.unwrap();
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[tokio::test]
    async fn test_failing_command_reports_status_and_output() {
        let dir = TempDir::new().unwrap();
        let runner = CommandRunner::new(
            "sh",
            vec!["-c".to_string(), "echo broken; exit 3".to_string()],
        );

        let err = runner.run("link", dir.path()).await.unwrap_err();
        match &err {
            JobError::Exited { status, output } => {
                assert_eq!(status.code(), Some(3));
                assert!(output.contains("broken"));
            }
            other => panic!("Expected Exited error, got {other:?}"),
        }
        assert!(err.diagnostic().contains("| Output: broken"));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_launch_error() {
        let dir = TempDir::new().unwrap();
        let runner = CommandRunner::new("tunedrop-nonexistent-binary-xyz", vec![]);

        let err = runner.run("link", dir.path()).await.unwrap_err();
        assert!(matches!(err, JobError::Launch { .. }));
    }
}
