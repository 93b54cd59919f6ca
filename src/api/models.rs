//! API models for the submit and status endpoints.
//!
//! - `POST /api/download` accepts a [`DownloadRequest`] and answers with a
//!   [`TaskCreatedResponse`] as soon as the task is registered
//! - `GET /api/download/status/{task_id}` streams Server-Sent Events:
//!
//! ```text
//! : connection established for task 01932c1e-...
//!
//! data: {"link":"a","status":"success"}
//!
//! data: {"link":"b","status":"fail","error":"exit status: 1 | Output: ..."}
//!
//! event: complete
//! data: {"message":"Task completed"}
//! ```
//!
//! An `event: error` frame carrying [`StreamError`] replaces the completion
//! event if the task's update channel closes before it signalled completion.

use serde::{Deserialize, Serialize};

use crate::observability::MetricsSnapshot;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DownloadRequest {
    pub links: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskCreatedResponse {
    pub task_id: String,
}

/// Payload of the `complete` SSE event
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompletionMessage {
    pub message: String,
}

impl Default for CompletionMessage {
    fn default() -> Self {
        Self {
            message: "Task completed".to_string(),
        }
    }
}

/// Payload of the `error` SSE event
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StreamError {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_tasks: usize,
    pub metrics: MetricsSnapshot,
}
