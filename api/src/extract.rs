//! Custom Axum extractors for bound and validated input
//!
//! `ValidatedJson<T>` and `ValidatedForm<T>` replace `Json<T>` / `Form<T>`
//! for request records. The body is bound through the shared
//! [`Validator`], and every failure is rejected with an [`ApiError`]
//! carrying the field error map.
//!
//! ```ignore
//! let ctx = BindContext::new(BindConfig::from_env());
//! let app = Router::new()
//!     .route("/users", post(create_user))
//!     .layer(ctx.body_limit())
//!     .with_state(ctx);
//!
//! async fn create_user(ValidatedJson(req): ValidatedJson<CreateUser>) -> impl IntoResponse {
//!     // req is bound and valid
//! }
//! ```

use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, FromRef, FromRequest, Multipart, Request},
    http::{header, StatusCode},
};
use reqbind::{classify, BindError, DecodeError, FileAttachment, FormData, Naming, Record, Validator};

use crate::config::BindConfig;
use crate::error::ApiError;
use crate::metrics;

const FORMAT_JSON: &str = "json";
const FORMAT_FORM: &str = "form";
const FORMAT_MULTIPART: &str = "multipart";

/// Shared binding state, reachable from router state through `FromRef`
#[derive(Clone, Debug)]
pub struct BindContext {
    validator: Arc<Validator>,
    config: BindConfig,
}

impl BindContext {
    pub fn new(config: BindConfig) -> Self {
        Self::with_validator(Arc::new(Validator::new()), config)
    }

    pub fn with_validator(validator: Arc<Validator>, config: BindConfig) -> Self {
        Self { validator, config }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Router layer applying the configured body bound to the extractors
    pub fn body_limit(&self) -> DefaultBodyLimit {
        DefaultBodyLimit::max(self.config.multipart_max_bytes)
    }
}

impl Default for BindContext {
    fn default() -> Self {
        Self::new(BindConfig::default())
    }
}

/// JSON extractor that binds and validates a [`Record`]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: Record + Send,
    S: Send + Sync,
    BindContext: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = BindContext::from_ref(state);
        let body = read_body(req, state, Naming::Json, FORMAT_JSON).await?;
        metrics::observe_body(FORMAT_JSON, body.len());

        ctx.validator()
            .bind_json::<T>(&body)
            .map(ValidatedJson)
            .map_err(|err| reject(FORMAT_JSON, err))
    }
}

/// Form extractor for url-encoded and multipart bodies
pub struct ValidatedForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedForm<T>
where
    T: Record + Send,
    S: Send + Sync,
    BindContext: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = BindContext::from_ref(state);
        let query = req.uri().query().map(str::to_owned);

        let (mut form, format) = if is_multipart(&req) {
            let limit = ctx.config().multipart_max_bytes;
            let (form, size) = read_multipart(req, state, limit)
                .await
                .map_err(|err| reject(FORMAT_MULTIPART, classify(err, Naming::Form)))?;
            metrics::observe_body(FORMAT_MULTIPART, size);
            (form, FORMAT_MULTIPART)
        } else {
            let body = read_body(req, state, Naming::Form, FORMAT_FORM).await?;
            metrics::observe_body(FORMAT_FORM, body.len());
            let form = FormData::from_urlencoded(&body)
                .map_err(|err| reject(FORMAT_FORM, classify(err, Naming::Form)))?;
            (form, FORMAT_FORM)
        };

        if ctx.config().merge_query {
            if let Some(query) = query {
                form.merge_query(&query)
                    .map_err(|err| reject(format, classify(err, Naming::Form)))?;
            }
        }

        ctx.validator()
            .bind_form::<T>(&form)
            .map(ValidatedForm)
            .map_err(|err| reject(format, err))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

async fn read_body<S: Send + Sync>(
    req: Request,
    state: &S,
    naming: Naming,
    format: &'static str,
) -> Result<Bytes, ApiError> {
    Bytes::from_request(req, state).await.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            // the limit comes from whatever body limit layer the router applies
            tracing::warn!(format, "request body exceeds the body limit");
            reject(format, classify(DecodeError::TooLarge { limit: None }, naming))
        } else {
            tracing::debug!(format, error = %rejection.body_text(), "failed to read request body");
            metrics::observe_rejection(format, "invalid_body");
            ApiError::bad_request(reqbind::ErrorKind::InvalidBody.code(), "Failed to read request body")
        }
    })
}

/// Read every part into memory. Text parts become values and parts with a
/// file name become attachments. Returns the form and the bytes read.
async fn read_multipart<S: Send + Sync>(
    req: Request,
    state: &S,
    limit: usize,
) -> Result<(FormData, usize), DecodeError> {
    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|rejection| DecodeError::syntax(rejection.body_text()))?;

    let mut form = FormData::multipart();
    let mut total = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) if file_name.is_some() && err.status() != StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(DecodeError::FileBinding {
                    field: name,
                    reason: err.body_text(),
                })
            }
            Err(err) => return Err(multipart_error(err, limit)),
        };

        total += bytes.len();
        if total > limit {
            tracing::warn!(limit, "multipart body exceeds the configured limit");
            return Err(DecodeError::TooLarge { limit: Some(limit) });
        }

        match file_name {
            Some(file_name) => {
                form.attach(name, FileAttachment::new(file_name, content_type, bytes.to_vec()));
            }
            None => {
                let value = String::from_utf8(bytes.to_vec())
                    .map_err(|_| DecodeError::syntax(format!("part `{}` is not valid UTF-8", name)))?;
                form.append(name, value);
            }
        }
    }

    Ok((form, total))
}

fn multipart_error(err: MultipartError, limit: usize) -> DecodeError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(limit, "multipart body exceeds the configured limit");
        DecodeError::TooLarge { limit: Some(limit) }
    } else {
        DecodeError::syntax(err.body_text())
    }
}

fn reject(format: &str, err: BindError) -> ApiError {
    let kind = match err.kind() {
        Some(reqbind::ErrorKind::InvalidBody) => "invalid_body",
        Some(reqbind::ErrorKind::InvalidData) => "invalid_data",
        None => "unclassified",
    };
    metrics::observe_rejection(format, kind);
    ApiError::from(err)
}

// Implement Deref for ergonomic access
impl<T> std::ops::Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for ValidatedJson<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> std::ops::Deref for ValidatedForm<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for ValidatedForm<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(content_type: &str) -> Request {
        axum::http::Request::builder()
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_multipart_detection() {
        assert!(is_multipart(&request("multipart/form-data; boundary=abc")));
        assert!(is_multipart(&request("Multipart/Form-Data; boundary=abc")));
        assert!(!is_multipart(&request("application/x-www-form-urlencoded")));
        assert!(!is_multipart(&Request::new(Body::empty())));
    }

    #[test]
    fn test_context_shares_validator() {
        let ctx = BindContext::default();
        let clone = ctx.clone();
        assert!(std::ptr::eq(ctx.validator(), clone.validator()));
        assert_eq!(clone.config(), &BindConfig::default());
    }
}
