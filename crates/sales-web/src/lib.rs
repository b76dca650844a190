//! # Sales Web
//!
//! The small web framework the sales API is built on.
//!
//! - [`app`]: [`App`], handler and middleware types, the composition order
//! - [`context`]: the explicit per-request [`RequestContext`] and [`Values`]
//! - [`errors`]: the trusted / untrusted / shutdown [`AppError`] taxonomy
//! - [`response`]: JSON responses and validated body decoding
//! - [`shutdown`]: the process shutdown signal raised by the pipeline
//!
//! Routing itself is axum's; [`App::into_router`] hands back a plain
//! [`axum::Router`] ready to be served.

pub mod app;
pub mod context;
pub mod errors;
pub mod response;
pub mod shutdown;

pub use app::{App, Handler, HandlerFuture, Middleware, handler, middleware, wrap_middleware};
pub use context::{RequestContext, Values};
pub use errors::{AppError, ErrorResponse, FieldError, INTERNAL_ERROR_MESSAGE, RequestError};
pub use response::{decode, respond, respond_error};
pub use shutdown::{ShutdownListener, ShutdownSignal};

// Route registration takes a method filter.
pub use axum::routing::MethodFilter;
