use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use sales_web::{Handler, Middleware, RequestContext, handler, middleware};
use tracing::{error, info, warn};

/// Logs the start of every request and its completion with status and
/// latency, whether the inner chain succeeded or not.
pub fn logger() -> Middleware {
    middleware(|inner: Handler| {
        handler(move |ctx: RequestContext, req: Request| {
            let inner = inner.clone();
            async move {
                let values = ctx.values()?.clone();
                let method = req.method().clone();
                let path = req.uri().path().to_string();
                let remote_addr = req
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.to_string())
                    .unwrap_or_else(|| "unknown".to_string());

                info!(
                    trace_id = %values.trace_id,
                    method = %method,
                    path = %path,
                    remote_addr = %remote_addr,
                    started_at = %values.now.to_rfc3339(),
                    "request started"
                );

                let result = inner(ctx, req).await;

                // Falls back to the outcome when no response went through respond().
                let status = match values.status_code() {
                    0 => match &result {
                        Ok(response) => response.status().as_u16(),
                        Err(err) => err.status().as_u16(),
                    },
                    status => status,
                };
                let latency_ms = values.elapsed().as_millis();

                match status {
                    400..=499 => warn!(
                        trace_id = %values.trace_id,
                        method = %method,
                        path = %path,
                        remote_addr = %remote_addr,
                        status = status,
                        latency_ms = %latency_ms,
                        "request completed"
                    ),
                    500..=599 => error!(
                        trace_id = %values.trace_id,
                        method = %method,
                        path = %path,
                        remote_addr = %remote_addr,
                        status = status,
                        latency_ms = %latency_ms,
                        "request completed"
                    ),
                    _ => info!(
                        trace_id = %values.trace_id,
                        method = %method,
                        path = %path,
                        remote_addr = %remote_addr,
                        status = status,
                        latency_ms = %latency_ms,
                        "request completed"
                    ),
                }

                result
            }
        })
    })
}
