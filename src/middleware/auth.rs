use std::sync::Arc;

use anyhow::anyhow;
use axum::{extract::Request, http::header};
use sales_auth::Auth;
use sales_web::{AppError, Handler, Middleware, RequestContext, handler, middleware};
use tracing::{Instrument, info_span};

const BEARER_FORMAT: &str = "expected authorization header format: bearer <token>";

/// Extracts the token from an `Authorization` header value.
///
/// The value must be exactly two space-separated parts: the `bearer`
/// scheme (any case) and a non-empty token.
pub fn parse_authorization(value: &str) -> Result<&str, AppError> {
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(AppError::unauthorized(anyhow!(BEARER_FORMAT))),
    }
}

/// Validates the bearer token and stores its claims in the request context.
///
/// A missing or malformed header and any token the service rejects are a
/// trusted 401; the inner handler never runs.
pub fn authenticate(auth: Arc<Auth>) -> Middleware {
    middleware(move |inner: Handler| {
        let auth = auth.clone();
        handler(move |mut ctx: RequestContext, req: Request| {
            let auth = auth.clone();
            let inner = inner.clone();
            let span = info_span!("middleware.authenticate");

            async move {
                let claims = {
                    let value = req
                        .headers()
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .ok_or_else(|| AppError::unauthorized(anyhow!(BEARER_FORMAT)))?;
                    let token = parse_authorization(value)?;

                    auth.validate_token(token).map_err(AppError::unauthorized)?
                };

                ctx.set_claims(claims);
                inner(ctx, req).await
            }
            .instrument(span)
        })
    })
}

/// Requires the authenticated claims to carry at least one of `roles`.
///
/// Runs after [`authenticate`]. Claims missing from the context mean the
/// route was wired without it, which is reported as a shutdown error rather
/// than a denial.
pub fn authorize(roles: &[&str]) -> Middleware {
    let roles: Arc<[String]> = roles.iter().map(|r| r.to_string()).collect();

    middleware(move |inner: Handler| {
        let roles = roles.clone();
        handler(move |ctx: RequestContext, req: Request| {
            let roles = roles.clone();
            let inner = inner.clone();
            let span = info_span!("middleware.authorize", roles = ?roles);

            async move {
                {
                    let claims = ctx.require_claims()?;
                    if !claims.has_role(&roles[..]) {
                        return Err(AppError::forbidden(anyhow!(
                            "you are not authorized for that action, claims[{:?}] roles[{:?}]",
                            claims.roles,
                            roles
                        )));
                    }
                }

                inner(ctx, req).await
            }
            .instrument(span)
        })
    })
}
