//! Task lifecycle: registration, sequential execution, and observation
//!
//! ## Key Components
//!
//! - [`TaskRegistry`] - lock-guarded map from task id to live [`Task`]
//! - [`TaskExecutor`] - runs a task's links one at a time and signals completion once
//! - [`TaskObserver`] - per-client reader yielding [`TaskEvent`]s
//!
//! A task's write half ([`TaskHandle`]) is moved into its executor, so only
//! that executor can publish results or the completion signal. Observers
//! hold the read half through the shared [`Task`].

mod executor;
mod observer;
mod registry;
mod types;

pub use executor::TaskExecutor;
pub use observer::{CHANNEL_CLOSED_MESSAGE, TaskEvent, TaskObserver};
pub use registry::TaskRegistry;
pub use types::{ResultStatus, Task, TaskHandle, TaskResult};
