//! Recognition worker threads.
//!
//! Each worker takes captured cards off the shared queue, scans them and
//! collects the records. Workers exit when the queue closes, or as soon as
//! one of them hits an error that ends the whole session.

use parking_lot::Mutex;
use std::sync::mpsc::Receiver;

use crate::automation::queue::RecognitionTask;
use crate::config::RarityColors;
use crate::error::ScanError;
use crate::scan::{scan_card, ItemRecord, ScanContext};

/// A card that could not be scanned.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TaskFailure {
    pub id: u64,
    pub error: String,
}

/// Results shared by all workers of a session.
#[derive(Default)]
pub struct ResultSink {
    records: Mutex<Vec<ItemRecord>>,
    failures: Mutex<Vec<TaskFailure>>,
    fatal: Mutex<Option<ScanError>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records sorted by id, failures, and the first fatal error if any.
    pub fn into_parts(self) -> (Vec<ItemRecord>, Vec<TaskFailure>, Option<ScanError>) {
        let mut records = self.records.into_inner();
        records.sort_by_key(|r| r.id);
        let mut failures = self.failures.into_inner();
        failures.sort_by_key(|f| f.id);
        (records, failures, self.fatal.into_inner())
    }

    fn set_fatal(&self, error: ScanError) {
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(error);
        }
    }
}

/// Runs the worker loop until the queue closes or the session is cancelled.
///
/// This function blocks, so it should be run in a dedicated thread.
pub fn run_recognition_worker(
    worker: usize,
    receiver: &Mutex<Receiver<RecognitionTask>>,
    ctx: &ScanContext<'_>,
    colors: &RarityColors,
    sink: &ResultSink,
) {
    tracing::debug!("Worker {} started", worker);

    loop {
        // Only hold the lock while waiting for the next task.
        let task = match receiver.lock().recv() {
            Ok(task) => task,
            Err(_) => {
                tracing::debug!("Worker {}: queue closed, exiting", worker);
                break;
            }
        };
        if ctx.cancel.is_cancelled() {
            tracing::debug!("Worker {}: session cancelled, dropping item {}", worker, task.id);
            break;
        }

        let id = task.id;
        match scan_card(ctx, id, task.kind, task.capture, colors, task.captured_at) {
            Ok(record) => sink.records.lock().push(record),
            Err(e) if e.is_fatal() => {
                tracing::error!("Worker {}: item {} failed, stopping: {}", worker, id, e);
                ctx.cancel.cancel();
                sink.set_fatal(e);
                break;
            }
            Err(e) => {
                ctx.observer.warning(&format!("Item {id} could not be scanned: {e}"));
                sink.failures.lock().push(TaskFailure {
                    id,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::debug!("Worker {} finished", worker);
}
