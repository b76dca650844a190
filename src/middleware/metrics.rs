use std::sync::Arc;

use axum::extract::Request;
use sales_web::{Handler, Middleware, RequestContext, handler, middleware};

use crate::metrics::{Metrics, SAMPLE_EVERY};

/// Counts every request and every error escaping the inner chain, and
/// samples the live task count every [`SAMPLE_EVERY`] requests.
pub fn metrics(sink: Arc<Metrics>) -> Middleware {
    middleware(move |inner: Handler| {
        let sink = sink.clone();
        handler(move |ctx: RequestContext, req: Request| {
            let sink = sink.clone();
            let inner = inner.clone();
            async move {
                let result = inner(ctx, req).await;

                let requests = sink.add_request();
                if requests % SAMPLE_EVERY == 0 {
                    sink.sample_tasks();
                }

                if result.is_err() {
                    sink.add_error();
                }

                result
            }
        })
    })
}
