//! The surface consumed by the surrounding application.

use shared::{ComparisonResult, TaskRecord};

use crate::compare::ComparisonService;
use crate::config::EngineConfig;
use crate::tasks::tracker::ComparisonTracker;

/// Entry point wiring the comparison pipeline to its task tracker.
pub struct AiService {
    service: ComparisonService,
    tracker: ComparisonTracker,
}

impl AiService {
    pub fn new(config: EngineConfig) -> Self {
        let service = ComparisonService::new(config);
        let tracker = ComparisonTracker::new(service.clone());
        Self { service, tracker }
    }

    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    /// Synchronously compare a borrow/return photo pair.
    pub fn compare(&self, image1: &str, image2: &str, use_mock: bool) -> ComparisonResult {
        self.service.compare(image1, image2, use_mock)
    }

    /// Start an asynchronous comparison; returns the task token immediately.
    pub fn create_comparison_task(&self, image1: &str, image2: &str) -> String {
        self.tracker.create_task(image1, image2)
    }

    /// Full task record, or `None` for an unknown token.
    pub fn get_task_status(&self, task_id: &str) -> Option<TaskRecord> {
        self.tracker.store().get_task_status(task_id)
    }

    /// The comparison result once the task has completed; `None` otherwise,
    /// including for unknown tokens.
    pub fn get_task_result(&self, task_id: &str) -> Option<ComparisonResult> {
        self.tracker.store().get_task_result(task_id)
    }

    /// Drain queued comparisons and stop the worker pool.
    pub fn shutdown(mut self) {
        self.tracker.shutdown();
    }
}
