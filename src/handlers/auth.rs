use axum::{extract::Request, http::StatusCode};
use sales_web::{Handler, RequestContext, handler, respond};
use serde::Serialize;

use crate::state::AppState;

/// Echoes the claims of the authenticated caller.
pub fn claims() -> Handler {
    handler(|ctx: RequestContext, _req: Request| async move {
        let claims = ctx.require_claims()?;
        respond(&ctx, claims, StatusCode::OK)
    })
}

#[derive(Debug, Serialize)]
pub struct SigningKeys {
    pub algorithm: String,
    pub kids: Vec<String>,
}

/// Lists the KIDs the service currently signs with.
pub fn keys(state: AppState) -> Handler {
    handler(move |ctx: RequestContext, _req: Request| {
        let auth = state.auth.clone();
        async move {
            let keys = SigningKeys {
                algorithm: format!("{:?}", auth.algorithm()),
                kids: auth.keys().kids(),
            };
            respond(&ctx, &keys, StatusCode::OK)
        }
    })
}
