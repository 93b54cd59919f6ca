//! Sequential driver for one task's links

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::registry::TaskRegistry;
use super::types::{TaskHandle, TaskResult};
use crate::observability::Metrics;
use crate::runner::JobRunner;

/// Runs every link of a task through the job runner, one at a time
#[derive(Clone)]
pub struct TaskExecutor {
    registry: Arc<TaskRegistry>,
    runner: Arc<dyn JobRunner>,
    output_dir: PathBuf,
    metrics: Arc<Metrics>,
}

impl TaskExecutor {
    pub fn new(
        registry: Arc<TaskRegistry>,
        runner: Arc<dyn JobRunner>,
        output_dir: impl Into<PathBuf>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            runner,
            output_dir: output_dir.into(),
            metrics,
        }
    }

    /// Drive the task in the background; the join handle is not kept
    pub fn spawn(&self, handle: TaskHandle) {
        let executor = self.clone();
        tokio::spawn(async move { executor.run(handle).await });
    }

    /// Process all links, then signal completion and deregister the task
    ///
    /// Completion is signalled from a drop guard, so it also happens when the
    /// runner panics or the future is dropped mid-flight.
    pub async fn run(&self, handle: TaskHandle) {
        let TaskHandle {
            id,
            links,
            progress,
            completion,
        } = handle;

        let guard = CompletionGuard {
            task_id: id,
            registry: Arc::clone(&self.registry),
            progress: Some(progress),
            completion: Some(completion),
        };

        if let Err(err) = tokio::fs::create_dir_all(&self.output_dir).await {
            error!(
                task_id = %guard.task_id,
                path = %self.output_dir.display(),
                error = %err,
                "Error creating output directory"
            );
            let diagnostic = format!("could not create output directory: {}", err);
            for link in &links {
                self.metrics.item_failed();
                guard.publish(TaskResult::failure(link, diagnostic.clone())).await;
            }
            return;
        }

        for link in &links {
            info!(task_id = %guard.task_id, link = %link, "Downloading");

            let result = match self.runner.run(link, &self.output_dir).await {
                Ok(output) => {
                    info!(
                        task_id = %guard.task_id,
                        link = %link,
                        output = %output,
                        "Successfully downloaded"
                    );
                    self.metrics.item_succeeded();
                    TaskResult::success(link)
                }
                Err(err) => {
                    let diagnostic = err.diagnostic();
                    error!(
                        task_id = %guard.task_id,
                        link = %link,
                        error = %diagnostic,
                        "Download failed"
                    );
                    self.metrics.item_failed();
                    TaskResult::failure(link, diagnostic)
                }
            };

            guard.publish(result).await;
        }
    }
}

/// Owns the task's write half and tears it down exactly once
struct CompletionGuard {
    task_id: String,
    registry: Arc<TaskRegistry>,
    progress: Option<mpsc::Sender<TaskResult>>,
    completion: Option<watch::Sender<bool>>,
}

impl CompletionGuard {
    async fn publish(&self, result: TaskResult) {
        let Some(progress) = &self.progress else {
            return;
        };

        if progress.send(result).await.is_err() {
            warn!(task_id = %self.task_id, "No reader left for task updates, result dropped");
        } else {
            debug!(task_id = %self.task_id, "Result published");
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        // Order matters: signal, close, then deregister
        if let Some(completion) = self.completion.take() {
            completion.send_replace(true);
        }
        self.progress.take();
        self.registry.remove(&self.task_id);

        info!(task_id = %self.task_id, "Task completed and cleaned up");
    }
}
