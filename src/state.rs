use std::sync::Arc;

use sales_auth::Auth;

use crate::db::HealthCheck;
use crate::metrics::Metrics;

/// Everything the route handlers share.
#[derive(Clone)]
pub struct AppState {
    pub build: String,
    pub auth: Arc<Auth>,
    pub db: Arc<dyn HealthCheck>,
    pub metrics: Arc<Metrics>,
}
