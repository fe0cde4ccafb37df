//! Runtime helpers for synchronous CLI surfaces.

use crate::{InfraError, InfraResult};
use cinedex_shared::RequestContext;
use std::future::Future;

/// Run an async operation to completion on a fresh runtime.
///
/// Ctrl-C cancels `ctx`; the operation observes it cooperatively and the
/// watcher is dropped with the runtime.
pub fn block_on_with_ctrl_c<F, T>(
    ctx: RequestContext,
    op: impl FnOnce(RequestContext) -> F,
) -> InfraResult<T>
where
    F: Future<Output = T>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    Ok(runtime.block_on(async {
        let watcher = spawn_ctrl_c_watcher(&ctx);
        let output = op(ctx).await;
        watcher.abort();
        output
    }))
}

/// Cancel `ctx` on the first Ctrl-C.
pub fn spawn_ctrl_c_watcher(ctx: &RequestContext) -> tokio::task::JoinHandle<()> {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            ctx.cancel();
        }
    })
}
