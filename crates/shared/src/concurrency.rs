//! Concurrency primitives and request-scoped context.
//!
//! - Cancellation + correlation identifiers via `RequestContext`
//! - A bounded worker pool (`WorkerPool`) for concurrent fan-out over a list
//!   of inputs, with results collected in submission order
//!
//! Cancellation is cooperative: work that has not started is skipped once the
//! context is cancelled; work already in flight runs to completion and its
//! result is discarded.

use crate::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Notify, Semaphore};

/// A correlation identifier used for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a correlation identifier from user input.
    ///
    /// The value is trimmed; empty values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::invalid_input(
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::<str>::from(trimmed)))
    }

    /// Create a new request id, best-effort unique within this process.
    #[must_use]
    pub fn new_request_id() -> Self {
        next_scoped_id(&REQUEST_ID_COUNTER, "req_")
    }

    /// Create a new warm-job id, best-effort unique within this process.
    #[must_use]
    pub fn new_job_id() -> Self {
        next_scoped_id(&JOB_ID_COUNTER, "warm_")
    }

    /// Borrow the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_scoped_id(counter: &AtomicU64, prefix: &'static str) -> CorrelationId {
    let n = counter.fetch_add(1, Ordering::Relaxed);
    CorrelationId(Arc::<str>::from(format!("{prefix}{n}")))
}

/// A clonable cancellation token that can be awaited.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Cancel the token and wake all current waiters.
    pub fn cancel(&self) {
        let was_cancelled = self.inner.cancelled.swap(true, Ordering::SeqCst);
        if !was_cancelled {
            self.inner.notify.notify_waiters();
        }
    }

    /// Returns true if the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Request-scoped context passed across boundaries.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a new request context with a fresh cancellation token.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a context with an auto-generated `req_*` id.
    #[must_use]
    pub fn new_request() -> Self {
        Self::new(CorrelationId::new_request_id())
    }

    /// Create a context sharing an existing cancellation token.
    #[must_use]
    pub const fn with_cancellation(
        correlation_id: CorrelationId,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            correlation_id,
            cancellation,
        }
    }

    /// Return the correlation id.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Return a clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Returns true if the request was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this request.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Await cancellation.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Return a cancellation error when cancelled, including operation metadata.
    pub fn ensure_not_cancelled(&self, operation: &'static str) -> Result<()> {
        if self.is_cancelled() {
            return Err(cancelled_error(operation));
        }
        Ok(())
    }
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}

/// Options for the worker pool.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolOptions {
    /// Maximum number of tasks running at the same time.
    pub concurrency: usize,
}

/// A bounded worker pool executor.
///
/// - at most `concurrency` tasks run at once
/// - tasks waiting for a slot are skipped when the context is cancelled
/// - `map` returns results in input order regardless of completion order
#[derive(Debug)]
pub struct WorkerPool {
    ctx: RequestContext,
    slots: Arc<Semaphore>,
    concurrency: usize,
}

impl WorkerPool {
    /// Create a new worker pool bound to the provided `RequestContext`.
    pub fn new(ctx: RequestContext, options: WorkerPoolOptions) -> Result<Self> {
        if options.concurrency == 0 {
            return Err(ErrorEnvelope::invalid_input(
                "concurrency must be a positive number",
            ));
        }

        Ok(Self {
            ctx,
            slots: Arc::new(Semaphore::new(options.concurrency)),
            concurrency: options.concurrency,
        })
    }

    /// Return the configured concurrency bound.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Apply an async function over inputs, bounded by the pool's concurrency.
    ///
    /// Every task is scheduled up front and the call returns once all of them
    /// completed (a barrier). The output vector is in input order. The first
    /// task error, or cancellation of the pool's context, aborts the wait;
    /// tasks already running are detached and their results dropped.
    pub async fn map<TIn, TOut, Fut, F>(&self, inputs: Vec<TIn>, f: F) -> Result<Vec<TOut>>
    where
        TIn: Send + 'static,
        TOut: Send + 'static,
        Fut: Future<Output = Result<TOut>> + Send + 'static,
        F: Fn(TIn, usize) -> Fut + Send + Sync + 'static,
    {
        self.ctx.ensure_not_cancelled("worker_pool.map")?;

        let f = Arc::new(f);
        let mut handles = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            let slots = Arc::clone(&self.slots);
            let ctx = self.ctx.clone();
            let f = Arc::clone(&f);
            handles.push(tokio::spawn(async move {
                let _slot = tokio::select! {
                    () = ctx.cancelled() => return Err(cancelled_error("worker_pool.map.acquire")),
                    slot = slots.acquire_owned() => slot.map_err(|_| pool_closed_error())?,
                };
                ctx.ensure_not_cancelled("worker_pool.map.start")?;
                f(input, index).await
            }));
        }

        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            let joined = tokio::select! {
                () = self.ctx.cancelled() => return Err(cancelled_error("worker_pool.map.await")),
                joined = handle => joined,
            };
            let value = joined.map_err(|join_error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::internal(),
                    format!("worker task failed: {join_error}"),
                    ErrorClass::NonRetriable,
                )
            })??;
            out.push(value);
        }
        Ok(out)
    }
}

fn pool_closed_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::internal(),
        "worker pool closed",
        ErrorClass::NonRetriable,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn map_returns_results_in_input_order() -> Result<()> {
        let pool = WorkerPool::new(
            RequestContext::new_request(),
            WorkerPoolOptions { concurrency: 2 },
        )?;

        let out = pool
            .map(vec![1u64, 2, 3, 4], |value, index| async move {
                // Later inputs finish first.
                let delay_ms = (4 - index as u64) * 10;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(value * 2)
            })
            .await?;

        assert_eq!(out, vec![2, 4, 6, 8]);
        Ok(())
    }

    #[tokio::test]
    async fn map_never_exceeds_concurrency() -> Result<()> {
        let pool = WorkerPool::new(
            RequestContext::new_request(),
            WorkerPoolOptions { concurrency: 3 },
        )?;
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tracked_running = Arc::clone(&running);
        let tracked_peak = Arc::clone(&peak);
        let out = pool
            .map((0..12).collect::<Vec<u32>>(), move |value, _| {
                let running = Arc::clone(&tracked_running);
                let peak = Arc::clone(&tracked_peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(value)
                }
            })
            .await?;

        assert_eq!(out.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_pool_skips_waiting_work() -> Result<()> {
        let ctx = RequestContext::new_request();
        let pool = WorkerPool::new(ctx.clone(), WorkerPoolOptions { concurrency: 1 })?;
        let started = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&started);
        let cancel = async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            ctx.cancel();
        };
        let run = pool.map(vec![1u32, 2, 3], move |value, _| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(60)).await;
                Ok(value)
            }
        });

        let (result, ()) = tokio::join!(run, cancel);
        assert!(matches!(result, Err(ref error) if error.is_cancelled()));

        // Give detached tasks a chance to observe the cancellation.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result = WorkerPool::new(
            RequestContext::new_request(),
            WorkerPoolOptions { concurrency: 0 },
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancellation_token_wakes_waiters() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        tokio::task::yield_now().await;
        token.cancel();
        let joined = tokio::time::timeout(Duration::from_millis(200), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }
}
