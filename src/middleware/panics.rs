use std::any::Any;
use std::panic::AssertUnwindSafe;

use anyhow::anyhow;
use axum::extract::Request;
use futures::FutureExt;
use sales_web::{AppError, Handler, Middleware, RequestContext, handler, middleware};
use tracing::{Instrument, error, info_span};

/// Recovers from a panic anywhere in the inner chain and turns it into an
/// untrusted error.
///
/// The panic hook installed by [`crate::logging::install_panic_hook`] has
/// already logged the backtrace by the time the panic is caught here.
pub fn panics() -> Middleware {
    middleware(|inner: Handler| {
        handler(move |ctx: RequestContext, req: Request| {
            let inner = inner.clone();
            async move {
                let trace_id = ctx.values()?.trace_id.clone();
                let span = info_span!("middleware.panics", trace_id = %trace_id);

                let guarded = AssertUnwindSafe(async move { inner(ctx, req).await });

                match guarded.catch_unwind().instrument(span).await {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(&*payload);
                        error!(trace_id = %trace_id, panic = %message, "recovered from panic");
                        Err(AppError::internal(anyhow!("PANIC [{}]", message)))
                    }
                }
            }
        })
    })
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
