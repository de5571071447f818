//! Seams between the request pipeline and its external collaborators.
//!
//! Both traits are dyn-compatible by returning boxed futures instead of
//! `impl Future`, so the serving context can hold `Arc<dyn _>` handles and
//! tests can swap in in-memory implementations.

use crate::adapter::clickhouse::SummaryRow;
use crate::error::SummarizerError;
use crate::store::BoundInsert;
use std::future::Future;
use std::pin::Pin;

pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SummarizerError>> + Send + 'a>>;

/// A live session against the summaries store.
pub trait SummarySession: Send + Sync {
    /// Round trip proving the store is reachable.
    fn ping(&self) -> PortFuture<'_, ()>;

    /// Create the database objects the row shape needs, if missing.
    fn ensure_schema<'a>(&'a self, table: &'a str) -> PortFuture<'a, ()>;

    /// Execute a single bound insert. Exactly one row on success.
    fn execute<'a>(&'a self, insert: &'a BoundInsert) -> PortFuture<'a, ()>;

    /// Full table scan.
    fn scan<'a>(&'a self, table: &'a str) -> PortFuture<'a, Vec<SummaryRow>>;
}

/// Order-preserving, all-or-nothing batched text generation.
pub trait BatchInference: Send + Sync {
    /// `output[i]` is the generation for `texts[i]`.
    fn infer_batch(&self, texts: Vec<String>) -> PortFuture<'_, Vec<String>>;

    /// Liveness and readiness of the inference server.
    fn health_check(&self) -> PortFuture<'_, ()>;
}
