//! Middlewares wrapped around every route handler.
//!
//! Each function here returns a [`sales_web::Middleware`]. Global ones are
//! passed to [`sales_web::App::new`], route ones to [`sales_web::App::handle`].
//!
//! # Modules
//!
//! - [`auth`]: bearer-token authentication and role authorization
//! - [`errors`]: turns handler errors into client responses
//! - [`logger`]: request start and completion log lines
//! - [`metrics`]: request, error and task counters
//! - [`panics`]: converts handler panics into ordinary errors
//!
//! # Order
//!
//! The API installs the global middlewares as
//! `[logger(), errors(), metrics(..), panics()]`, so a panic is recovered
//! before it is counted, answered and logged:
//!
//! ```ignore
//! use sales_api::middleware::{authenticate, authorize, errors, logger, metrics, panics};
//!
//! let mut app = App::new(shutdown, vec![logger(), errors(), metrics(sink), panics()]);
//! app.handle(
//!     MethodFilter::GET,
//!     "/v1/auth/keys",
//!     keys(auth.clone()),
//!     &[authenticate(auth), authorize(&[ROLE_ADMIN])],
//! );
//! ```

pub mod auth;
pub mod errors;
pub mod logger;
pub mod metrics;
pub mod panics;

pub use self::auth::{authenticate, authorize, parse_authorization};
pub use self::errors::errors;
pub use self::logger::logger;
pub use self::metrics::metrics;
pub use self::panics::panics;
