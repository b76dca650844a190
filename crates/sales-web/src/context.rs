//! Request-scoped state passed explicitly through the handler chain.

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use sales_auth::Claims;
use uuid::Uuid;

use crate::errors::AppError;

/// Metadata attached to one inbound request.
///
/// Created once by the pipeline and shared by reference with every layer.
/// The status code is written when the response is emitted and read by the
/// logger and metrics layers once the inner chain returns.
#[derive(Debug)]
pub struct Values {
    pub trace_id: String,
    /// Wall-clock time the request arrived.
    pub now: DateTime<Utc>,
    started: Instant,
    status_code: AtomicU16,
}

impl Values {
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4().to_string())
    }

    pub fn with_trace_id(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            now: Utc::now(),
            started: Instant::now(),
            status_code: AtomicU16::new(0),
        }
    }

    /// Status of the emitted response, 0 until one is emitted.
    pub fn status_code(&self) -> u16 {
        self.status_code.load(Ordering::Acquire)
    }

    pub fn set_status_code(&self, status: StatusCode) {
        self.status_code.store(status.as_u16(), Ordering::Release);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit request context handed to every handler and middleware.
///
/// Missing pieces are checkable: [`RequestContext::values`] and
/// [`RequestContext::require_claims`] report an integrity violation instead
/// of guessing.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    values: Option<Arc<Values>>,
    claims: Option<Arc<Claims>>,
}

impl RequestContext {
    pub fn new(values: Arc<Values>) -> Self {
        Self {
            values: Some(values),
            claims: None,
        }
    }

    /// Request metadata, or a shutdown error when the pipeline did not
    /// install it.
    pub fn values(&self) -> Result<&Arc<Values>, AppError> {
        self.values
            .as_ref()
            .ok_or_else(|| AppError::shutdown("web value missing from context"))
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_deref()
    }

    /// Claims stored by authentication, or a shutdown error when no
    /// authentication step ran before this point.
    pub fn require_claims(&self) -> Result<&Claims, AppError> {
        self.claims()
            .ok_or_else(|| AppError::shutdown("auth claims missing from context"))
    }

    pub fn set_claims(&mut self, claims: Claims) {
        self.claims = Some(Arc::new(claims));
    }

    pub fn with_claims(mut self, claims: Claims) -> Self {
        self.set_claims(claims);
        self
    }
}
