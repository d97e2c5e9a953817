//! Constraint engine
//!
//! The engine evaluates a record's declared constraints and reports every
//! failed constraint as a [`Violation`]. Violation paths are structural:
//! they use internal field identifiers with bracketed list indices
//! (`roles[0].name`). Mapping those back to wire names is the path
//! resolver's job.

use serde_json::Value;

use crate::rules::{self, Check, Constraint, DIVE, OMITEMPTY, REQUIRED};
use crate::shape::{FieldKind, Shape};

/// One failed constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Constraint kind, e.g. `required`
    pub tag: String,
    /// Structural path in internal identifiers
    pub path: String,
    pub param: Option<String>,
}

impl Violation {
    pub fn new(tag: impl Into<String>, path: impl Into<String>, param: Option<String>) -> Self {
        Self {
            tag: tag.into(),
            path: path.into(),
            param,
        }
    }
}

/// Evaluates declared constraints against a record's serde value
pub trait ConstraintEngine: Send + Sync {
    /// Violations in the order they were found; empty when the record is valid
    fn check(&self, shape: &'static Shape, value: &Value) -> Vec<Violation>;
}

/// The built-in engine driven by the shape's constraint tags.
///
/// Per field, checking stops at the first failed constraint. Nested records
/// are always checked; list elements only after `dive`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagEngine;

enum Flow {
    Continue,
    Stop,
}

impl ConstraintEngine for TagEngine {
    fn check(&self, shape: &'static Shape, value: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.check_record(shape, value, "", &mut violations);
        violations
    }
}

impl TagEngine {
    fn check_record(&self, shape: &Shape, value: &Value, prefix: &str, out: &mut Vec<Violation>) {
        for field in shape.fields() {
            let path = if prefix.is_empty() {
                field.ident().to_string()
            } else {
                format!("{}.{}", prefix, field.ident())
            };
            let field_value = value.get(field.serde_key()).unwrap_or(&Value::Null);
            self.check_field(field.kind(), field.constraints(), field_value, &path, out);
        }
    }

    fn check_field(
        &self,
        kind: &FieldKind,
        constraints: &[Constraint],
        value: &Value,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        let (own, element) = match constraints.iter().position(|c| c.tag == DIVE) {
            Some(at) => (&constraints[..at], Some(&constraints[at + 1..])),
            None => (constraints, None),
        };

        if let Flow::Stop = self.apply(own, value, kind.is_nullable(), path, out) {
            return;
        }

        if let Some(element) = element {
            let Value::Array(items) = value else {
                return;
            };
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                if let Flow::Stop = self.apply(element, item, false, &item_path, out) {
                    continue;
                }
                if let FieldKind::RecordList(shape) = kind {
                    if item.is_object() {
                        self.check_record(shape(), item, &item_path, out);
                    }
                }
            }
            return;
        }

        if let FieldKind::Record(shape) | FieldKind::OptionalRecord(shape) = kind {
            if value.is_object() {
                self.check_record(shape(), value, path, out);
            }
        }
    }

    /// `optional` marks a value that may be absent (`null`). For such a
    /// value `required` and `omitempty` only ask whether it is present, so a
    /// submitted `false` or `0` counts as given.
    fn apply(
        &self,
        constraints: &[Constraint],
        value: &Value,
        optional: bool,
        path: &str,
        out: &mut Vec<Violation>,
    ) -> Flow {
        let absent = if optional {
            value.is_null()
        } else {
            rules::is_zero(value)
        };

        for constraint in constraints {
            if constraint.tag == OMITEMPTY {
                if absent {
                    return Flow::Stop;
                }
                continue;
            }
            // an absent optional value only answers to `required`
            if value.is_null() && constraint.tag != REQUIRED {
                return Flow::Stop;
            }
            let check = if optional && constraint.tag == REQUIRED {
                Check::from(!absent)
            } else {
                rules::evaluate(constraint, value)
            };
            match check {
                Check::Pass => {}
                Check::Fail => {
                    out.push(Violation::new(
                        constraint.tag,
                        path,
                        constraint.param.map(str::to_string),
                    ));
                    return Flow::Stop;
                }
                Check::Unsupported => {
                    tracing::warn!(
                        tag = constraint.tag,
                        param = constraint.param,
                        path,
                        "unsupported constraint, skipping"
                    );
                }
            }
        }
        Flow::Continue
    }
}
