//! Worker-pool dispatch for tracked comparisons.
//!
//! Task creation returns immediately; a bounded pool of worker threads
//! drains the job queue, maps pipeline milestones onto progress updates
//! and completes the record. A task only ever advances from processing to
//! completed; a load failure completes it carrying an error-bearing
//! result, it is never a distinct state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};
use uuid::Uuid;

use crate::compare::ComparisonService;
use crate::tasks::store::TaskStore;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
// sleep in small slices so shutdown stays responsive
const SWEEP_GRANULARITY: Duration = Duration::from_millis(250);

struct Job {
    task_id: String,
    image1: String,
    image2: String,
}

pub struct ComparisonTracker {
    store: TaskStore,
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    janitor: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl ComparisonTracker {
    pub fn new(service: ComparisonService) -> Self {
        let store = TaskStore::new();
        let worker_count = service.config().workers.max(1);
        let task_ttl = service.config().task_ttl;

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let shutdown = Arc::new(AtomicBool::new(false));

        let workers = (0..worker_count)
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let store = store.clone();
                let service = service.clone();
                thread::spawn(move || worker_loop(receiver, store, service))
            })
            .collect();

        let janitor = task_ttl.map(|ttl| {
            let store = store.clone();
            let flag = Arc::clone(&shutdown);
            thread::spawn(move || janitor_loop(store, ttl, flag))
        });

        info!("comparison tracker started with {worker_count} worker(s)");
        Self {
            store,
            sender: Some(sender),
            workers,
            janitor,
            shutdown,
        }
    }

    /// Create the task record and enqueue the comparison; returns the fresh
    /// opaque task token immediately.
    pub fn create_task(&self, image1: &str, image2: &str) -> String {
        let task_id = Uuid::new_v4().to_string();
        self.store.start_comparison(&task_id, image1, image2);

        let job = Job {
            task_id: task_id.clone(),
            image1: image1.to_string(),
            image2: image2.to_string(),
        };
        match &self.sender {
            Some(sender) => {
                if sender.send(job).is_err() {
                    warn!("task {task_id} created after the worker pool stopped; it will not run");
                }
            }
            None => warn!("task {task_id} created after shutdown; it will not run"),
        }
        task_id
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Stop intake, drain queued jobs, join every thread. Idempotent.
    pub fn shutdown(&mut self) {
        if self.sender.is_none() && self.workers.is_empty() {
            return;
        }
        // dropping the sender lets workers finish the queue and exit
        self.sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(janitor) = self.janitor.take() {
            let _ = janitor.join();
        }
        info!("comparison tracker stopped");
    }
}

impl Drop for ComparisonTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: Arc<Mutex<Receiver<Job>>>, store: TaskStore, service: ComparisonService) {
    loop {
        let job = {
            let guard = receiver.lock().unwrap();
            guard.recv()
        };
        let Ok(job) = job else {
            break; // channel closed, queue drained
        };

        let task_id = job.task_id;
        let progress = |percent: u8, step: &str| {
            store.update_task_progress(&task_id, percent, step);
        };
        let result = service.compare_with_progress(&job.image1, &job.image2, false, Some(&progress));
        store.complete_task(&task_id, result);
    }
}

fn janitor_loop(store: TaskStore, ttl: Duration, shutdown: Arc<AtomicBool>) {
    let slices = (SWEEP_INTERVAL.as_millis() / SWEEP_GRANULARITY.as_millis()).max(1);
    loop {
        for _ in 0..slices {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            thread::sleep(SWEEP_GRANULARITY);
        }
        store.sweep_completed(ttl);
    }
}
