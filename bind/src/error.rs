use thiserror::Error;

use crate::field_errors::FieldErrors;

/// Why a request body could not be turned into a record
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Empty or whitespace-only body
    #[error("request body is empty")]
    EmptyBody,

    /// The body is not well-formed for its encoding
    #[error("malformed body: {message}")]
    Syntax { message: String },

    /// A key that names no field of the target record
    #[error("unknown field `{field}`")]
    UnknownField { field: String },

    /// A value that cannot convert to its field's declared type
    #[error("field {field}: cannot convert {got} to {expected}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    /// The body does not have the structure of a record at all
    #[error("cannot bind body: {0}")]
    Structural(String),

    /// An uploaded file that could not be attached
    #[error("file field {field}: {reason}")]
    FileBinding { field: String, reason: String },

    /// Body larger than the in-memory bound. `limit` is set when the
    /// bound that tripped is known.
    #[error("body exceeds {}", describe_limit(.limit))]
    TooLarge { limit: Option<usize> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Residual deserialization failure after the shape checks passed
    #[error("cannot build record: {0}")]
    Data(#[source] serde_json::Error),
}

fn describe_limit(limit: &Option<usize>) -> String {
    match limit {
        Some(bytes) => format!("the {} byte limit", bytes),
        None => "the body size limit".to_string(),
    }
}

impl DecodeError {
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        DecodeError::TypeMismatch {
            field: field.into(),
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        DecodeError::Syntax {
            message: message.into(),
        }
    }
}

/// Coarse classification handed to the response layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidBody,
    InvalidData,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidBody => "INVALID_BODY",
            ErrorKind::InvalidData => "INVALID_DATA",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidBody => "Invalid body",
            ErrorKind::InvalidData => "Invalid data",
        }
    }
}

/// Outcome of a failed bind-and-validate call
#[derive(Debug, Error)]
pub enum BindError {
    /// The body could not be bound. Carries a map when the failure is
    /// attributable to one field or to the body as a whole.
    #[error("invalid body")]
    InvalidBody(Option<FieldErrors>),

    /// The body bound but its values are unacceptable
    #[error("invalid data")]
    InvalidData(FieldErrors),

    /// A decode failure with no field-level rendering, left for the caller
    #[error(transparent)]
    Decode(DecodeError),

    #[error("cannot serialize record for validation: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl BindError {
    /// `None` for failures that were not classified
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            BindError::InvalidBody(_) => Some(ErrorKind::InvalidBody),
            BindError::InvalidData(_) => Some(ErrorKind::InvalidData),
            BindError::Decode(_) | BindError::Serialize(_) => None,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            BindError::InvalidBody(errors) => errors.as_ref(),
            BindError::InvalidData(errors) => Some(errors),
            BindError::Decode(_) | BindError::Serialize(_) => None,
        }
    }

    /// Split into the field error map and the error kind
    pub fn into_parts(self) -> (Option<FieldErrors>, Option<ErrorKind>) {
        let kind = self.kind();
        let errors = match self {
            BindError::InvalidBody(errors) => errors,
            BindError::InvalidData(errors) => Some(errors),
            BindError::Decode(_) | BindError::Serialize(_) => None,
        };
        (errors, kind)
    }
}
