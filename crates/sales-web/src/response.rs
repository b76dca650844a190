use anyhow::anyhow;
use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use validator::Validate;

use crate::context::RequestContext;
use crate::errors::AppError;

/// Largest request body [`decode`] will buffer.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Serializes `data` as the JSON response and records `status` in the
/// request values for the logger and metrics layers.
pub fn respond<T>(ctx: &RequestContext, data: &T, status: StatusCode) -> Result<Response, AppError>
where
    T: Serialize + ?Sized,
{
    let values = ctx.values()?;
    values.set_status_code(status);

    if status == StatusCode::NO_CONTENT {
        return Ok(status.into_response());
    }

    let body = serde_json::to_vec(data)?;

    Ok((
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        body,
    )
        .into_response())
}

/// Sends `err` to the client: trusted errors with their own status and
/// fields, everything else as a bare 500.
pub fn respond_error(ctx: &RequestContext, err: &AppError) -> Result<Response, AppError> {
    respond(ctx, &err.to_response_body(), err.status())
}

/// Reads a JSON body and runs its validation rules.
///
/// Unreadable or malformed bodies are a trusted 400; failed validation is a
/// trusted 422 listing the offending fields.
pub async fn decode<T>(req: Request) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::bad_request(anyhow!("reading request body: {}", e)))?;

    let value: T = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request(anyhow!("decoding request body: {}", e)))?;

    value
        .validate()
        .map_err(|errors| AppError::validation(&errors))?;

    Ok(value)
}
