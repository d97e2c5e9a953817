//! Bind-and-validate orchestration
//!
//! A [`Validator`] owns a constraint engine and runs the full pipeline for
//! one request body: decode, classify decode failures into field errors,
//! then validate the bound record and map every violation to its wire path
//! and message.
//!
//! ```ignore
//! let validator = Validator::new();
//! match validator.bind_json::<CreateUser>(&body) {
//!     Ok(user) => { /* ... */ }
//!     Err(err) => return Err(ApiError::from(err)),
//! }
//! ```

use crate::engine::{ConstraintEngine, TagEngine};
use crate::error::{BindError, DecodeError};
use crate::field_errors::FieldErrors;
use crate::file;
use crate::form::{self, FormData};
use crate::json;
use crate::message::message;
use crate::path::resolve;
use crate::shape::{Naming, Record};

const JSON_SYNTAX_MESSAGE: &str =
    "invalid JSON format: please check for missing commas, braces, or quotes";
const FORM_SYNTAX_MESSAGE: &str = "invalid form data format";
const UNKNOWN_FIELD_MESSAGE: &str = "unknown field";
const FILE_BINDING_MESSAGE: &str = "file could not be read";

/// Caller-owned validator. Holds no per-call state, so one instance can be
/// shared across concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct Validator<E = TagEngine> {
    engine: E,
}

impl Validator<TagEngine> {
    pub fn new() -> Self {
        Self { engine: TagEngine }
    }
}

impl<E: ConstraintEngine> Validator<E> {
    pub fn with_engine(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the constraint pass over a bound record.
    ///
    /// Field errors are keyed by wire path for `naming`. A valid record
    /// yields `Ok(())`, never an empty map. Attachment content is not
    /// copied into the inspected value.
    pub fn validate<T: Record>(&self, record: &T, naming: Naming) -> Result<(), BindError> {
        let shape = T::shape();
        let value = file::without_content(|| serde_json::to_value(record))
            .map_err(BindError::Serialize)?;

        let violations = self.engine.check(shape, &value);
        if violations.is_empty() {
            return Ok(());
        }

        let mut errors = FieldErrors::new();
        for violation in &violations {
            errors.add(resolve(shape, &violation.path, naming), message(violation));
        }

        tracing::debug!(
            record = shape.name(),
            violations = violations.len(),
            fields = errors.len(),
            "record failed validation"
        );
        Err(BindError::InvalidData(errors))
    }

    /// Decode a JSON body into `T` and validate it
    pub fn bind_json<T: Record>(&self, body: &[u8]) -> Result<T, BindError> {
        let record = json::decode::<T>(body).map_err(|err| classify(err, Naming::Json))?;
        self.validate(&record, Naming::Json)?;
        Ok(record)
    }

    /// Bind form data into `T` and validate it
    pub fn bind_form<T: Record>(&self, form: &FormData) -> Result<T, BindError> {
        let record = form::decode::<T>(form).map_err(|err| classify(err, Naming::Form))?;
        self.validate(&record, Naming::Form)?;
        Ok(record)
    }
}

/// Turn a decode failure into the error handed back to the caller.
///
/// Failures attributable to one field or to the body as a whole become a
/// single-entry field error map. Anything else is passed through as
/// [`BindError::Decode`].
pub fn classify(err: DecodeError, naming: Naming) -> BindError {
    let body_key = match naming {
        Naming::Json => "json",
        Naming::Form => "form",
    };
    tracing::debug!(format = body_key, error = %err, "request body could not be decoded");

    match err {
        DecodeError::Syntax { .. } => {
            let message = match naming {
                Naming::Json => JSON_SYNTAX_MESSAGE,
                Naming::Form => FORM_SYNTAX_MESSAGE,
            };
            BindError::InvalidBody(Some(FieldErrors::single(body_key, message)))
        }
        DecodeError::UnknownField { field } => {
            BindError::InvalidBody(Some(FieldErrors::single(field, UNKNOWN_FIELD_MESSAGE)))
        }
        DecodeError::TypeMismatch { field, expected, .. } => BindError::InvalidData(
            FieldErrors::single(field, format!("invalid type, expected {}", expected)),
        ),
        DecodeError::FileBinding { field, .. } => {
            BindError::InvalidBody(Some(FieldErrors::single(field, FILE_BINDING_MESSAGE)))
        }
        DecodeError::TooLarge { .. } => {
            let message = match naming {
                Naming::Json => "JSON body exceeds the maximum allowed size",
                Naming::Form => "form data exceeds the maximum allowed size",
            };
            BindError::InvalidBody(Some(FieldErrors::single(body_key, message)))
        }
        DecodeError::Structural(_) => BindError::InvalidBody(None),
        other @ (DecodeError::EmptyBody | DecodeError::Io(_) | DecodeError::Data(_)) => {
            BindError::Decode(other)
        }
    }
}
