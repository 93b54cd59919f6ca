use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tracing::debug;
use uuid::Uuid;

use super::types::{Task, TaskHandle};

/// Process-wide map of live tasks
///
/// Every operation takes the same lock and only performs map work under it,
/// so the lock is never held across channel I/O or an `.await`.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, Arc<Task>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<String, Arc<Task>>> {
        // The map holds no invariant a panicking holder could break halfway
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new task and return the handle its executor consumes
    ///
    /// The progress channel holds one slot per link, so publishing never
    /// waits on a missing observer and results stay buffered for late ones.
    pub fn create(&self, links: Vec<String>, credential: Option<String>) -> TaskHandle {
        let (progress_tx, progress_rx) = mpsc::channel(links.len().max(1));
        let (completion_tx, completion_rx) = watch::channel(false);

        let mut tasks = self.tasks();
        let id = loop {
            let candidate = Uuid::now_v7().to_string();
            if !tasks.contains_key(&candidate) {
                break candidate;
            }
        };

        let task = Task::new(
            id.clone(),
            links.clone(),
            credential,
            progress_rx,
            completion_rx,
        );
        tasks.insert(id.clone(), Arc::new(task));
        drop(tasks);

        debug!(task_id = %id, links = links.len(), "Task registered");

        TaskHandle {
            id,
            links,
            progress: progress_tx,
            completion: completion_tx,
        }
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Task>> {
        self.tasks().get(id).cloned()
    }

    /// Remove a task; removing an unknown id is a no-op
    pub fn remove(&self, id: &str) -> Option<Arc<Task>> {
        let removed = self.tasks().remove(id);
        if removed.is_some() {
            debug!(task_id = %id, "Task deregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks().is_empty()
    }
}
