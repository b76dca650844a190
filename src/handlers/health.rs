use std::time::Duration;

use axum::{extract::Request, http::StatusCode};
use sales_web::{Handler, RequestContext, handler, respond};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// How long the database gets to answer a ping.
const PING_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub build: String,
}

/// Reports whether the service is ready: 200 when the database answers,
/// 500 otherwise.
pub fn readiness(state: AppState) -> Handler {
    handler(move |ctx: RequestContext, _req: Request| {
        let state = state.clone();
        async move {
            let ping = tokio::time::timeout(PING_TIMEOUT, state.db.ping()).await;

            let (status, code) = match ping {
                Ok(Ok(())) => ("ok", StatusCode::OK),
                Ok(Err(e)) => {
                    warn!(error = %format!("{:#}", e), "readiness check failed");
                    ("db not ready", StatusCode::INTERNAL_SERVER_ERROR)
                }
                Err(_) => {
                    warn!("readiness check timed out");
                    ("db not ready", StatusCode::INTERNAL_SERVER_ERROR)
                }
            };

            let health = Health {
                status,
                build: state.build.clone(),
            };
            respond(&ctx, &health, code)
        }
    })
}
