use axum::extract::Request;
use sales_web::{Handler, Middleware, RequestContext, handler, middleware, respond_error};
use tracing::{error, warn};

/// Answers every error coming out of the inner chain.
///
/// Trusted errors go out with their own status and message, anything else
/// as a generic 500. Shutdown errors are answered too and then returned, so
/// the pipeline still sees them.
pub fn errors() -> Middleware {
    middleware(|inner: Handler| {
        handler(move |ctx: RequestContext, req: Request| {
            let inner = inner.clone();
            async move {
                let values = ctx.values()?.clone();

                let err = match inner(ctx.clone(), req).await {
                    Ok(response) => return Ok(response),
                    Err(err) => err,
                };

                if err.is_trusted() {
                    warn!(trace_id = %values.trace_id, error = %err, "request failed");
                } else {
                    error!(trace_id = %values.trace_id, error = %err, "request failed");
                }

                let response = respond_error(&ctx, &err)?;

                if err.is_shutdown() {
                    return Err(err);
                }

                Ok(response)
            }
        })
    })
}
