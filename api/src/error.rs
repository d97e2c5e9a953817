use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use reqbind::{BindError, DecodeError, ErrorKind, FieldErrors};
use serde::Serialize;
use uuid::Uuid;

pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
    errors: Option<FieldErrors>,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    errors: FieldErrors,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<ErrorDetails>,
    code: u16,
    timestamp: String,
    correlation_id: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
            errors: None,
        }
    }

    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR, message)
    }

    /// A 400 carrying the binding error kind and, when present, its field errors
    pub fn from_kind(kind: ErrorKind, errors: Option<FieldErrors>) -> Self {
        Self {
            errors,
            ..Self::bad_request(kind.code(), kind.message())
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.errors.as_ref()
    }
}

impl From<BindError> for ApiError {
    fn from(err: BindError) -> Self {
        match err {
            BindError::Decode(DecodeError::EmptyBody) => {
                ApiError::bad_request(ErrorKind::InvalidBody.code(), "Request body is empty")
            }
            other => {
                let description = other.to_string();
                match other.into_parts() {
                    (errors, Some(kind)) => ApiError::from_kind(kind, errors),
                    (_, None) => {
                        tracing::error!(error = %description, "request binding failed");
                        ApiError::internal("Failed to process request body")
                    }
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let correlation_id = Uuid::new_v4().to_string();
        let payload = ErrorResponse {
            error: self.error,
            message: self.message,
            details: self.errors.map(|errors| ErrorDetails { errors }),
            code: self.status.as_u16(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            correlation_id: correlation_id.clone(),
        };

        let mut response = (self.status, Json(payload)).into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            response.headers_mut().insert(header::HeaderName::from_static("x-correlation-id"), value);
        }
        response
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
