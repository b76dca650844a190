//! The middleware pipeline.
//!
//! A [`Handler`] takes the explicit [`RequestContext`] plus the request and
//! returns a response or an [`AppError`]. A [`Middleware`] wraps one handler
//! into another. [`App::handle`] composes, for each route, the route
//! middlewares around the business handler and then the global middlewares
//! around that, first-declared outermost within each group:
//!
//! ```text
//! global[0]( global[1]( ... route[0]( route[1]( handler ) ) ) )
//! ```
//!
//! On every request the pipeline creates a fresh [`Values`], runs the chain
//! and, if an error still escapes it, signals process shutdown. The errors
//! middleware is expected to have answered every ordinary failure by then,
//! so an escaping error means a route was wired without it or a context
//! invariant broke.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{MethodFilter, on},
};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::error;

use crate::context::{RequestContext, Values};
use crate::errors::AppError;
use crate::response::respond_error;
use crate::shutdown::ShutdownSignal;

pub type HandlerFuture = BoxFuture<'static, Result<Response, AppError>>;

/// A request handler in the chain, business logic or wrapped.
pub type Handler = Arc<dyn Fn(RequestContext, Request) -> HandlerFuture + Send + Sync>;

/// Wraps a handler with cross-cutting behavior.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Turns an async function or closure into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, AppError>> + Send + 'static,
{
    Arc::new(move |ctx, req| f(ctx, req).boxed())
}

/// Turns a handler-wrapping closure into a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps `handler` so that `mw[0]` runs first.
pub fn wrap_middleware(mw: &[Middleware], handler: Handler) -> Handler {
    mw.iter().rev().fold(handler, |inner, wrap| wrap(inner))
}

/// Entry point into the web application: owns the routes, the global
/// middlewares and the shutdown signal.
pub struct App {
    router: Router,
    shutdown: ShutdownSignal,
    mw: Vec<Middleware>,
}

impl App {
    pub fn new(shutdown: ShutdownSignal, mw: Vec<Middleware>) -> Self {
        Self {
            router: Router::new(),
            shutdown,
            mw,
        }
    }

    /// Registers `handler` for `method` on `path`, wrapped by `mw` and then
    /// by the global middlewares.
    pub fn handle(
        &mut self,
        method: MethodFilter,
        path: &str,
        handler: Handler,
        mw: &[Middleware],
    ) {
        let chain = wrap_middleware(&self.mw, wrap_middleware(mw, handler));
        let shutdown = self.shutdown.clone();

        let route = move |req: Request| {
            let chain = chain.clone();
            let shutdown = shutdown.clone();
            async move { dispatch(chain, shutdown, req).await }
        };

        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.route(path, on(method, route));
    }

    /// Asks the owning process to shut down.
    pub fn signal_shutdown(&self) {
        self.shutdown.signal();
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn dispatch(chain: Handler, shutdown: ShutdownSignal, req: Request) -> Response {
    let values = Arc::new(Values::new());
    let ctx = RequestContext::new(values.clone());

    match chain(ctx.clone(), req).await {
        Ok(response) => response,
        Err(err) => {
            error!(
                trace_id = %values.trace_id,
                error = %err,
                "error escaped the middleware chain"
            );
            shutdown.signal();
            respond_error(&ctx, &err)
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}
