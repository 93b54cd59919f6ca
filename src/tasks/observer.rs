//! Per-observer event loop over a task's channels

use futures::Stream;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use super::types::{Task, TaskResult};

pub const CHANNEL_CLOSED_MESSAGE: &str = "Updates channel closed unexpectedly on server.";

/// Event delivered to an attached observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Result(TaskResult),
    Complete,
    Error(String),
}

impl TaskEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskEvent::Result(_))
    }
}

enum Ready {
    Progress(Option<TaskResult>),
    Completed,
    Abandoned,
}

/// One attached reader of a task
///
/// Yields results in processing order, then exactly one terminal event,
/// then nothing. Dropping the observer before the terminal event is a
/// client disconnect and leaves the executor untouched.
#[derive(Debug)]
pub struct TaskObserver {
    task: Arc<Task>,
    completion: watch::Receiver<bool>,
    closed: bool,
}

impl TaskObserver {
    pub(crate) fn new(task: Arc<Task>, completion: watch::Receiver<bool>) -> Self {
        Self {
            task,
            completion,
            closed: false,
        }
    }

    pub fn task_id(&self) -> &str {
        self.task.id()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub async fn next_event(&mut self) -> Option<TaskEvent> {
        if self.closed {
            return None;
        }

        let ready = tokio::select! {
            biased;
            received = self.task.recv_progress() => Ready::Progress(received),
            done = self.completion.wait_for(|done| *done) => {
                if done.is_ok() { Ready::Completed } else { Ready::Abandoned }
            }
        };

        let event = match ready {
            Ready::Progress(Some(result)) => TaskEvent::Result(result),
            Ready::Progress(None) if *self.completion.borrow() => TaskEvent::Complete,
            Ready::Progress(None) | Ready::Abandoned => {
                error!(
                    task_id = %self.task.id(),
                    "Updates channel closed before completion signal"
                );
                TaskEvent::Error(CHANNEL_CLOSED_MESSAGE.to_string())
            }
            // Results buffered before the signal still go out ahead of it
            Ready::Completed => match self.task.try_recv_progress() {
                Some(result) => TaskEvent::Result(result),
                None => TaskEvent::Complete,
            },
        };

        if event.is_terminal() {
            self.closed = true;
            if event == TaskEvent::Complete {
                info!(task_id = %self.task.id(), "All items processed, sending completion event");
            }
        }

        Some(event)
    }

    pub fn into_stream(self) -> impl Stream<Item = TaskEvent> + Send + 'static {
        futures::stream::unfold(self, |mut observer| async move {
            let event = observer.next_event().await?;
            Some((event, observer))
        })
    }
}

impl Drop for TaskObserver {
    fn drop(&mut self) {
        if !self.closed {
            info!(task_id = %self.task.id(), "Client disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskRegistry;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::time::timeout;

    fn links(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_buffered_results_precede_completion() {
        let registry = TaskRegistry::new();
        let handle = registry.create(links(&["a", "b"]), None);
        let task = registry.lookup(handle.id()).unwrap();

        handle.progress.send(TaskResult::success("a")).await.unwrap();
        handle.progress.send(TaskResult::failure("b", "nope")).await.unwrap();
        handle.completion.send_replace(true);
        drop(handle);

        let events: Vec<_> = task.observe().into_stream().collect().await;
        assert_eq!(
            events,
            vec![
                TaskEvent::Result(TaskResult::success("a")),
                TaskEvent::Result(TaskResult::failure("b", "nope")),
                TaskEvent::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_completion_while_senders_alive() {
        let registry = TaskRegistry::new();
        let handle = registry.create(links(&["a"]), None);
        let task = registry.lookup(handle.id()).unwrap();

        handle.progress.send(TaskResult::success("a")).await.unwrap();
        handle.completion.send_replace(true);

        let mut observer = task.observe();
        assert_eq!(
            observer.next_event().await,
            Some(TaskEvent::Result(TaskResult::success("a")))
        );
        assert_eq!(observer.next_event().await, Some(TaskEvent::Complete));
        assert_eq!(observer.next_event().await, None);
        assert!(observer.is_closed());
        drop(handle);
    }

    #[tokio::test]
    async fn test_channel_closed_without_signal_is_an_error() {
        let registry = TaskRegistry::new();
        let handle = registry.create(links(&["a"]), None);
        let task = registry.lookup(handle.id()).unwrap();

        // Producer goes away without ever signalling completion
        drop(handle);

        let events: Vec<_> = task.observe().into_stream().collect().await;
        assert_eq!(
            events,
            vec![TaskEvent::Error(CHANNEL_CLOSED_MESSAGE.to_string())]
        );
    }

    #[tokio::test]
    async fn test_observer_waits_for_next_result() {
        let registry = TaskRegistry::new();
        let handle = registry.create(links(&["a"]), None);
        let task = registry.lookup(handle.id()).unwrap();
        let mut observer = task.observe();

        let pending = timeout(Duration::from_millis(50), observer.next_event()).await;
        assert!(pending.is_err());

        handle.progress.send(TaskResult::success("a")).await.unwrap();
        let event = timeout(Duration::from_secs(1), observer.next_event())
            .await
            .unwrap();
        assert_eq!(event, Some(TaskEvent::Result(TaskResult::success("a"))));
    }

    #[tokio::test]
    async fn test_competing_observers_share_results() {
        let registry = TaskRegistry::new();
        let handle = registry.create(links(&["a", "b", "c"]), None);
        let task = registry.lookup(handle.id()).unwrap();

        let first = tokio::spawn(task.observe().into_stream().collect::<Vec<_>>());
        let second = tokio::spawn(task.observe().into_stream().collect::<Vec<_>>());

        for link in ["a", "b", "c"] {
            handle.progress.send(TaskResult::success(link)).await.unwrap();
        }
        handle.completion.send_replace(true);
        drop(handle);

        let first = timeout(Duration::from_secs(2), first).await.unwrap().unwrap();
        let second = timeout(Duration::from_secs(2), second).await.unwrap().unwrap();

        for events in [&first, &second] {
            assert_eq!(events.last(), Some(&TaskEvent::Complete));
            assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        }

        let mut seen: Vec<String> = first
            .iter()
            .chain(second.iter())
            .filter_map(|event| match event {
                TaskEvent::Result(result) => Some(result.link.clone()),
                _ => None,
            })
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
