//! Error taxonomy consumed by the middleware chain.
//!
//! | Variant | Meaning | Client sees |
//! |---|---|---|
//! | [`AppError::Request`] | trusted, raised on purpose by a handler | its status, message and field errors |
//! | [`AppError::Internal`] | untrusted, anything unexpected | a generic 500 |
//! | [`AppError::Shutdown`] | request-context integrity violation | a generic 500, then the process shuts down |
//!
//! Any error convertible into [`anyhow::Error`] becomes [`AppError::Internal`]
//! through `?`, so nothing leaks to clients unless a handler opts in.

use std::fmt;

use anyhow::{Error, anyhow};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// Message sent for every untrusted failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// JSON body emitted for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// A failure a handler deliberately exposes to the caller.
#[derive(Debug)]
pub struct RequestError {
    pub status: StatusCode,
    pub error: Error,
    pub fields: Option<Vec<FieldError>>,
}

#[derive(Debug)]
pub enum AppError {
    /// Trusted: answered with its own status and message.
    Request(RequestError),
    /// Untrusted: answered with a generic 500.
    Internal(Error),
    /// Contract violation: answered with a generic 500 and escalated to
    /// process shutdown.
    Shutdown(String),
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::Request(RequestError {
            status,
            error: err.into(),
            fields: None,
        })
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNAUTHORIZED, err)
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::FORBIDDEN, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::Internal(err.into())
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown(message.into())
    }

    /// Trusted 422 listing every field that failed validation.
    pub fn validation(errors: &ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    error: error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        Self::Request(RequestError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: anyhow!("data validation error"),
            fields: Some(fields),
        })
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown(_))
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Status the client receives for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Request(err) => err.status,
            Self::Internal(_) | Self::Shutdown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body the client receives for this error.
    pub fn to_response_body(&self) -> ErrorResponse {
        match self {
            Self::Request(err) => ErrorResponse {
                error: err.error.to_string(),
                fields: err.fields.clone(),
            },
            Self::Internal(_) | Self::Shutdown(_) => ErrorResponse {
                error: INTERNAL_ERROR_MESSAGE.to_string(),
                fields: None,
            },
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(err) => write!(f, "{:#}", err.error),
            Self::Internal(err) => write!(f, "{:#}", err),
            Self::Shutdown(msg) => write!(f, "shutdown requested: {}", msg),
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct NewUser {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_foreign_errors_are_untrusted() {
        fn parse() -> Result<u32, AppError> {
            Ok("nope".parse::<u32>()?)
        }
        let err = parse().unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_response_body().error, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_trusted_error_keeps_message() {
        let err = AppError::forbidden(anyhow!("not authorized"));
        assert!(err.is_trusted());
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_response_body().error, "not authorized");
    }

    #[test]
    fn test_shutdown_hides_detail() {
        let err = AppError::shutdown("web value missing from context");
        assert!(err.is_shutdown());
        assert!(!err.is_trusted());
        assert_eq!(err.to_response_body().error, INTERNAL_ERROR_MESSAGE);
        assert!(err.to_string().contains("web value missing"));
    }

    #[test]
    fn test_validation_lists_fields() {
        let user = NewUser {
            name: String::new(),
            email: "not-an-email".to_string(),
        };
        let err = AppError::validation(&user.validate().unwrap_err());

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = err.to_response_body();
        assert_eq!(body.error, "data validation error");
        assert_eq!(
            body.fields.unwrap(),
            vec![
                FieldError {
                    field: "email".to_string(),
                    error: "email is invalid".to_string(),
                },
                FieldError {
                    field: "name".to_string(),
                    error: "name is required".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_error_response_omits_empty_fields() {
        let body = ErrorResponse {
            error: "boom".to_string(),
            fields: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"error":"boom"}"#);
    }
}
