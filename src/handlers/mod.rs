//! Route registration.
//!
//! [`api`] is the single place routes meet their middlewares. Every route
//! runs under the global chain `logger → errors → metrics → panics`; routes
//! that need a principal add `authenticate`, admin-only routes add
//! `authorize` after it.

use sales_auth::ROLE_ADMIN;
use sales_web::{App, MethodFilter, ShutdownSignal};

use crate::middleware::{authenticate, authorize, errors, logger, metrics, panics};
use crate::state::AppState;

pub mod auth;
pub mod health;

/// Builds the API with all routes registered.
pub fn api(shutdown: ShutdownSignal, state: AppState) -> App {
    let mut app = App::new(
        shutdown,
        vec![logger(), errors(), metrics(state.metrics.clone()), panics()],
    );

    let authen = authenticate(state.auth.clone());
    let admin = authorize(&[ROLE_ADMIN]);

    app.handle(
        MethodFilter::GET,
        "/v1/healthcheck",
        health::readiness(state.clone()),
        &[],
    );
    app.handle(
        MethodFilter::GET,
        "/v1/auth/claims",
        auth::claims(),
        &[authen.clone()],
    );
    app.handle(
        MethodFilter::GET,
        "/v1/auth/keys",
        auth::keys(state),
        &[authen, admin],
    );

    app
}
