//! # Sales API
//!
//! Request-processing core of the sales service: token authentication and
//! role authorization wired into an onion-style middleware pipeline.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── sales-auth/     # Claims, key store, token issue/validate
//! ├── sales-web/      # App pipeline, request context, error taxonomy
//! ├── sales-config/   # Environment configuration
//! └── sales-cli/      # sales-admin (gentoken)
//! src/
//! ├── middleware/     # authenticate, authorize, errors, panics, logger, metrics
//! ├── handlers/       # healthcheck and auth routes
//! ├── db.rs           # database health collaborator
//! ├── logging.rs      # tracing subscriber, OTLP export, panic hook
//! └── metrics.rs      # counters sink and debug service
//! ```
//!
//! ## Request flow
//!
//! ```text
//! logger → errors → metrics → panics → [authenticate → authorize] → handler
//! ```
//!
//! Failures travel back out as [`sales_web::AppError`]: trusted errors are
//! answered with their status (401 for bad tokens, 403 for missing roles),
//! everything else as a generic 500. An error that escapes the errors
//! middleware signals process shutdown.
//!
//! ## Authentication
//!
//! Clients send `Authorization: Bearer <token>`. Tokens are RS256 by default,
//! carry the signing key id in the `kid` header and a `roles` claim with any
//! of `ADMIN`, `MASTER`, `OPERATOR`. Tokens can be issued with:
//!
//! ```bash
//! cargo run --bin sales-admin -- gentoken --roles ADMIN
//! ```
//!
//! ## Endpoints
//!
//! | Route | Middlewares |
//! |---|---|
//! | `GET /v1/healthcheck` | none |
//! | `GET /v1/auth/claims` | authenticate |
//! | `GET /v1/auth/keys` | authenticate, authorize(ADMIN) |
//!
//! The debug listener serves `GET /debug/vars` and `GET /metrics`.

pub mod db;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod state;

// Re-export workspace crates for convenience
pub use sales_auth;
pub use sales_config;
pub use sales_web;
