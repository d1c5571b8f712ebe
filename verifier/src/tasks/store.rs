//! Shared task-record store.
//!
//! One mutex guards the whole map, so every operation is atomic with
//! respect to the others; records are independent and need no cross-task
//! locking. Updates against unknown ids are tolerated as no-ops so
//! out-of-order or duplicate calls from a racing caller cannot corrupt
//! state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use shared::{ComparisonResult, TaskRecord, TaskStatus};

#[derive(Clone, Default)]
pub struct TaskStore {
    records: Arc<Mutex<HashMap<String, TaskRecord>>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the record for `id`: processing, zero progress, no result.
    /// Silently overwrites an existing record with the same id.
    pub fn start_comparison(&self, id: &str, image1: &str, image2: &str) {
        let mut records = self.records.lock().unwrap();
        if records.insert(id.to_string(), TaskRecord::new(id)).is_some() {
            warn!("task {id} restarted, previous record overwritten");
        } else {
            info!("task {id} created for {image1} vs {image2}");
        }
    }

    /// The full record, or `None` for an unknown id.
    pub fn get_task_status(&self, id: &str) -> Option<TaskRecord> {
        let records = self.records.lock().unwrap();
        let record = records.get(id).cloned();
        if record.is_none() {
            debug!("task {id} not found");
        }
        record
    }

    pub fn update_task_progress(&self, id: &str, progress: u8, step: &str) {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(id) {
            Some(record) => {
                record.set_progress(progress, step);
                debug!("task {id} progress {}% ({step})", record.progress);
            }
            None => debug!("progress update for unknown task {id} ignored"),
        }
    }

    pub fn complete_task(&self, id: &str, result: ComparisonResult) {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(id) {
            Some(record) => {
                record.set_result(result);
                info!("task {id} completed");
            }
            None => warn!("completion for unknown task {id} ignored"),
        }
    }

    /// The result, only once the task has completed; `None` otherwise,
    /// including for unknown ids.
    pub fn get_task_result(&self, id: &str) -> Option<ComparisonResult> {
        let records = self.records.lock().unwrap();
        records
            .get(id)
            .filter(|record| record.status == TaskStatus::Completed)
            .and_then(|record| record.result.clone())
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict completed records whose last update is older than `ttl`.
    /// Processing records are never evicted. Returns the eviction count.
    pub fn sweep_completed(&self, ttl: Duration) -> usize {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return 0;
        };
        let cutoff = Utc::now() - ttl;

        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, record| {
            record.status != TaskStatus::Completed || record.updated_at > cutoff
        });
        let evicted = before - records.len();
        if evicted > 0 {
            info!("swept {evicted} completed task record(s)");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_status_is_processing_at_zero() {
        let store = TaskStore::new();
        store.start_comparison("t1", "borrow.png", "return.png");

        let record = store.get_task_status("t1").unwrap();
        assert_eq!(record.status, TaskStatus::Processing);
        assert_eq!(record.progress, 0);
        assert_eq!(record.current_step, "started");
        assert!(record.result.is_none());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = TaskStore::new();
        assert!(store.get_task_status("missing").is_none());
    }

    #[test]
    fn progress_update_on_unknown_id_is_a_noop() {
        let store = TaskStore::new();
        store.start_comparison("t1", "borrow.png", "return.png");

        store.update_task_progress("missing", 50, "scoring similarity");
        assert_eq!(store.len(), 1);
        assert!(store.get_task_status("missing").is_none());
    }

    #[test]
    fn completion_on_unknown_id_is_a_noop() {
        let store = TaskStore::new();
        store.complete_task("missing", ComparisonResult::load_failure("x"));
        assert!(store.is_empty());
    }

    #[test]
    fn result_is_absent_until_completed() {
        let store = TaskStore::new();
        store.start_comparison("t1", "borrow.png", "return.png");
        store.update_task_progress("t1", 60, "scoring similarity");
        assert!(store.get_task_result("t1").is_none());

        let result = ComparisonResult::load_failure("decode failed");
        store.complete_task("t1", result.clone());

        let record = store.get_task_status("t1").unwrap();
        assert_eq!(record.status, TaskStatus::Completed);
        assert_eq!(record.progress, 100);
        assert_eq!(store.get_task_result("t1"), Some(result));
    }

    #[test]
    fn result_for_unknown_id_is_absent() {
        let store = TaskStore::new();
        assert!(store.get_task_result("missing").is_none());
    }

    #[test]
    fn progress_update_forces_processing() {
        let store = TaskStore::new();
        store.start_comparison("t1", "borrow.png", "return.png");
        store.complete_task("t1", ComparisonResult::load_failure("x"));

        store.update_task_progress("t1", 10, "loading images");
        let record = store.get_task_status("t1").unwrap();
        assert_eq!(record.status, TaskStatus::Processing);
        assert_eq!(record.progress, 10);
    }

    #[test]
    fn restart_overwrites_silently() {
        let store = TaskStore::new();
        store.start_comparison("t1", "borrow.png", "return.png");
        store.complete_task("t1", ComparisonResult::load_failure("x"));

        store.start_comparison("t1", "borrow.png", "return.png");
        let record = store.get_task_status("t1").unwrap();
        assert_eq!(record.status, TaskStatus::Processing);
        assert_eq!(record.progress, 0);
        assert!(record.result.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sweep_evicts_only_stale_completed_records() {
        let store = TaskStore::new();
        store.start_comparison("done", "borrow.png", "return.png");
        store.complete_task("done", ComparisonResult::load_failure("x"));
        store.start_comparison("running", "borrow.png", "return.png");

        // a zero TTL makes every completed record stale
        let evicted = store.sweep_completed(Duration::ZERO);
        assert_eq!(evicted, 1);
        assert!(store.get_task_status("done").is_none());
        assert!(store.get_task_status("running").is_some());
    }

    #[test]
    fn sweep_with_long_ttl_keeps_everything() {
        let store = TaskStore::new();
        store.start_comparison("done", "borrow.png", "return.png");
        store.complete_task("done", ComparisonResult::load_failure("x"));

        assert_eq!(store.sweep_completed(Duration::from_secs(3600)), 0);
        assert_eq!(store.len(), 1);
    }
}
