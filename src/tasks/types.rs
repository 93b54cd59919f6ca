use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};

use super::observer::TaskObserver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Fail,
}

/// Outcome of one processed link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub link: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn success(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            status: ResultStatus::Success,
            error: None,
        }
    }

    pub fn failure(link: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            status: ResultStatus::Fail,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Read side of a registered task
///
/// The progress receiver is shared by every observer, so each result is
/// delivered to at most one of them. The completion flag is a watch channel
/// and every observer sees it flip.
#[derive(Debug)]
pub struct Task {
    id: String,
    links: Vec<String>,
    credential: Option<String>,
    progress: Mutex<mpsc::Receiver<TaskResult>>,
    completion: watch::Receiver<bool>,
}

impl Task {
    pub(crate) fn new(
        id: String,
        links: Vec<String>,
        credential: Option<String>,
        progress: mpsc::Receiver<TaskResult>,
        completion: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id,
            links,
            credential,
            progress: Mutex::new(progress),
            completion,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Credential presented when the task was submitted
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        *self.completion.borrow()
    }

    /// Attach a new observer to this task's event channels
    pub fn observe(self: &Arc<Self>) -> TaskObserver {
        TaskObserver::new(Arc::clone(self), self.completion.clone())
    }

    pub(crate) async fn recv_progress(&self) -> Option<TaskResult> {
        self.progress.lock().await.recv().await
    }

    /// Non-blocking read of an already buffered result
    ///
    /// Returns `None` when nothing is buffered or another observer is
    /// currently reading.
    pub(crate) fn try_recv_progress(&self) -> Option<TaskResult> {
        self.progress
            .try_lock()
            .ok()
            .and_then(|mut receiver| receiver.try_recv().ok())
    }
}

/// Write side of a task, consumed by exactly one executor
///
/// Not `Clone`: whoever owns the handle is the only producer for the
/// task's channels.
#[derive(Debug)]
pub struct TaskHandle {
    pub(crate) id: String,
    pub(crate) links: Vec<String>,
    pub(crate) progress: mpsc::Sender<TaskResult>,
    pub(crate) completion: watch::Sender<bool>,
}

impl TaskHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }
}
