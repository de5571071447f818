//! Shared test support utilities
//!
//! In-memory implementations of `SummarySession` and `BatchInference` for unit
//! and integration tests. `MemorySession` can park an insert mid-flight so
//! tests can drive a specific interleaving of concurrent requests.

use crate::adapter::clickhouse::SummaryRow;
use crate::error::SummarizerError;
use crate::port::{BatchInference, PortFuture, SummarySession};
use crate::store::BoundInsert;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Handle to an insert parked inside [`MemorySession::execute`].
#[derive(Default)]
pub struct InsertHold {
    entered: Notify,
    release: Notify,
}

impl InsertHold {
    /// Resolves once the held insert has reached the store.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the held insert finish.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Clone, Copy)]
enum InsertFailure {
    Rejected,
    Disconnected,
}

/// Summaries store kept in memory.
#[derive(Default)]
pub struct MemorySession {
    rows: Mutex<Vec<SummaryRow>>,
    schema_requests: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    fail_at: Mutex<Option<(usize, InsertFailure)>>,
    hold: Mutex<Option<Arc<InsertHold>>>,
    yield_inside_insert: AtomicBool,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the insert attempt with this zero-based index.
    pub fn fail_insert_at(&self, attempt: usize) {
        *self.fail_at.lock().unwrap() = Some((attempt, InsertFailure::Rejected));
    }

    /// Lose the connection on the insert attempt with this zero-based index,
    /// the way a ClickHouse transport error surfaces.
    pub fn disconnect_at(&self, attempt: usize) {
        *self.fail_at.lock().unwrap() = Some((attempt, InsertFailure::Disconnected));
    }

    /// Park the next insert until the returned hold is released.
    pub fn hold_next_insert(&self) -> Arc<InsertHold> {
        let hold = Arc::new(InsertHold::default());
        *self.hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    /// Yield to the scheduler inside every insert, before the row lands.
    pub fn set_yield_inside_insert(&self, enabled: bool) {
        self.yield_inside_insert.store(enabled, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<SummaryRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn schema_requests(&self) -> Vec<String> {
        self.schema_requests.lock().unwrap().clone()
    }
}

impl SummarySession for MemorySession {
    fn ping(&self) -> PortFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn ensure_schema<'a>(&'a self, table: &'a str) -> PortFuture<'a, ()> {
        Box::pin(async move {
            self.schema_requests.lock().unwrap().push(table.to_string());
            Ok(())
        })
    }

    fn execute<'a>(&'a self, insert: &'a BoundInsert) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            let failure = match *self.fail_at.lock().unwrap() {
                Some((at, failure)) if at == attempt => Some(failure),
                _ => None,
            };
            match failure {
                Some(InsertFailure::Rejected) => {
                    return Err(SummarizerError::Store(format!(
                        "memory store rejected insert #{attempt}"
                    )));
                }
                Some(InsertFailure::Disconnected) => {
                    return Err(SummarizerError::Connection(format!(
                        "connection reset during insert #{attempt}"
                    )));
                }
                None => {}
            }

            let hold = self.hold.lock().unwrap().take();
            if let Some(hold) = hold {
                hold.entered.notify_one();
                hold.release.notified().await;
            }
            if self.yield_inside_insert.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }

            self.rows.lock().unwrap().push(insert.row().clone());
            Ok(())
        })
    }

    fn scan<'a>(&'a self, _table: &'a str) -> PortFuture<'a, Vec<SummaryRow>> {
        Box::pin(async move { Ok(self.rows()) })
    }
}

/// Deterministic inference: `summary of: {text}` for every input.
#[derive(Default)]
pub struct MockInference {
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
    should_fail: AtomicBool,
    drop_last_output: AtomicBool,
    unhealthy: AtomicBool,
}

impl MockInference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expected_output(text: &str) -> String {
        format!("summary of: {text}")
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// Return one output fewer than requested.
    pub fn set_drop_last_output(&self, enabled: bool) {
        self.drop_last_output.store(enabled, Ordering::SeqCst);
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

impl BatchInference for MockInference {
    fn infer_batch(&self, texts: Vec<String>) -> PortFuture<'_, Vec<String>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batches.lock().unwrap().push(texts.clone());
            if self.should_fail.load(Ordering::SeqCst) {
                return Err(SummarizerError::Inference(
                    "mock inference failure".to_string(),
                ));
            }
            let mut outputs: Vec<String> =
                texts.iter().map(|t| Self::expected_output(t)).collect();
            if self.drop_last_output.load(Ordering::SeqCst) {
                outputs.pop();
            }
            Ok(outputs)
        })
    }

    fn health_check(&self) -> PortFuture<'_, ()> {
        Box::pin(async move {
            if self.unhealthy.load(Ordering::SeqCst) {
                Err(SummarizerError::Inference(
                    "mock server not ready".to_string(),
                ))
            } else {
                Ok(())
            }
        })
    }
}
