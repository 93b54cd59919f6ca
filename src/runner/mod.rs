//! Job runner boundary
//!
//! A runner executes exactly one download for one link and reports the
//! combined output of the underlying tool. Runners hold no per-task state;
//! the executor decides what a failure means for the task.

mod command;

pub use command::CommandRunner;

use async_trait::async_trait;
use std::path::Path;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{status}")]
    Exited { status: ExitStatus, output: String },

    #[error("{0}")]
    Other(String),
}

impl JobError {
    /// Diagnostic text reported to observers for a failed item
    pub fn diagnostic(&self) -> String {
        match self {
            JobError::Exited { status, output } => {
                format!("{} | Output: {}", status, output)
            }
            other => other.to_string(),
        }
    }
}

/// Executes one download for one link into `destination`
///
/// Returns the tool's combined output on success.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, link: &str, destination: &Path) -> Result<String, JobError>;
}
