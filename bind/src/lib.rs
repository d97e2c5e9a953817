//! Tag-driven request binding and validation-error mapping.
//!
//! Request records describe themselves with a static [`Shape`]: wire names
//! for JSON and form encodings plus a constraint tag per field. A
//! [`Validator`] decodes a body onto the record, runs the constraint pass
//! and turns every failure into a [`FieldErrors`] map keyed by the paths a
//! client actually submitted.

pub mod engine;
pub mod error;
pub mod field_errors;
pub mod file;
pub mod form;
pub mod json;
pub mod message;
pub mod path;
pub mod rules;
pub mod shape;
pub mod validator;

pub use engine::{ConstraintEngine, TagEngine, Violation};
pub use error::{BindError, DecodeError, ErrorKind};
pub use field_errors::FieldErrors;
pub use file::FileAttachment;
pub use form::FormData;
pub use message::message;
pub use path::resolve;
pub use rules::Constraint;
pub use shape::{Field, FieldKind, Naming, Record, ScalarType, Shape, ShapeFn};
pub use validator::{classify, Validator};
