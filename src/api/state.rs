use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::runner::JobRunner;
use crate::tasks::{TaskExecutor, TaskRegistry};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<TaskRegistry>,
    pub executor: TaskExecutor,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, runner: Arc<dyn JobRunner>) -> Self {
        let registry = Arc::new(TaskRegistry::new());
        let metrics = Arc::new(Metrics::new());
        let executor = TaskExecutor::new(
            Arc::clone(&registry),
            runner,
            config.downloader.output_path.clone(),
            Arc::clone(&metrics),
        );

        Self {
            config: Arc::new(config),
            registry,
            executor,
            metrics,
        }
    }
}
