//! Timeout helpers with cancellation awareness.

use crate::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use std::future::Future;
use std::time::Duration;

/// Apply a timeout budget to a future, honoring request cancellation.
///
/// A timeout yields a retriable `core:timeout` error carrying the operation
/// name and the budget in milliseconds.
pub async fn timeout_with_context<T, F>(
    ctx: &RequestContext,
    budget: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    ctx.ensure_not_cancelled(operation)?;

    tokio::select! {
        () = ctx.cancelled() => Err(
            ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
        ),
        res = tokio::time::timeout(budget, fut) => {
            res.unwrap_or_else(|_| Err(timeout_error(operation, budget)))
        }
    }
}

fn timeout_error(operation: &'static str, budget: Duration) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::timeout(),
        format!("operation timed out: {operation}"),
        ErrorClass::Retriable,
    )
    .with_metadata("operation", operation)
    .with_metadata("timeoutMs", budget.as_millis().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_triggers() {
        let ctx = RequestContext::new_request();
        let fut = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, ErrorEnvelope>(())
        };

        let result = timeout_with_context(&ctx, Duration::from_millis(10), "test", fut).await;
        assert!(matches!(
            result,
            Err(ref error) if error.code == ErrorCode::timeout()
                && error.metadata.get("timeoutMs").map(String::as_str) == Some("10")
        ));
    }

    #[tokio::test]
    async fn cancellation_triggers() {
        let ctx = RequestContext::new_request();
        let token = ctx.cancellation_token();
        let fut = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, ErrorEnvelope>(())
        };

        let task = tokio::spawn(async move {
            timeout_with_context(&ctx, Duration::from_millis(200), "test_cancel", fut).await
        });

        tokio::task::yield_now().await;
        token.cancel();
        let result = task.await;
        assert!(matches!(result, Ok(Err(ref error)) if error.is_cancelled()));
    }

    #[tokio::test]
    async fn completed_future_passes_through() {
        let ctx = RequestContext::new_request();
        let result = timeout_with_context(&ctx, Duration::from_secs(1), "fast", async {
            Ok::<_, ErrorEnvelope>(7)
        })
        .await;
        assert!(matches!(result, Ok(7)));
    }
}
