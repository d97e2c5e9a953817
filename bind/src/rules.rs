//! Constraint tags and the checks behind them
//!
//! A constraint tag is a comma separated list of constraint kinds, each
//! optionally parameterised: `"required,max=100"`, `"oneof=admin user"`,
//! `"required,dive,uuid"`. Tags are parsed once when a shape is built.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

lazy_static! {
    /// Pragmatic address check: local part, `@`, dotted domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    ).unwrap();

    /// Optionally signed integer or decimal
    static ref NUMERIC_REGEX: Regex = Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").unwrap();

    static ref ALPHANUM_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9]+$").unwrap();
}

/// Skips the remaining constraints of a zero value
pub const OMITEMPTY: &str = "omitempty";

/// Constraints after this marker apply to each list element
pub const DIVE: &str = "dive";

pub const REQUIRED: &str = "required";

/// One declared constraint: its kind and optional parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    pub tag: &'static str,
    pub param: Option<&'static str>,
}

impl Constraint {
    /// Parse a constraint tag into its constraints, in declaration order
    pub fn parse_tag(tag: &'static str) -> Vec<Constraint> {
        tag.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once('=') {
                Some((tag, param)) => Constraint {
                    tag: tag.trim(),
                    param: Some(param.trim()),
                },
                None => Constraint {
                    tag: part,
                    param: None,
                },
            })
            .collect()
    }
}

/// Result of evaluating one constraint against one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Check {
    Pass,
    Fail,
    /// Kind not understood, or its parameter is malformed
    Unsupported,
}

impl From<bool> for Check {
    fn from(ok: bool) -> Self {
        if ok {
            Check::Pass
        } else {
            Check::Fail
        }
    }
}

/// Whether a value is the zero value of its type
pub(crate) fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

/// Canonical boolean spellings: `1 t T TRUE true True` and their negatives
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Evaluate a single constraint. `omitempty` and `dive` are structural and
/// handled by the engine, never here.
pub(crate) fn evaluate(constraint: &Constraint, value: &Value) -> Check {
    match constraint.tag {
        REQUIRED => (!is_zero(value)).into(),
        "min" => compare(constraint.param, value, |m, p| m >= p),
        "max" => compare(constraint.param, value, |m, p| m <= p),
        "len" => compare(constraint.param, value, |m, p| m == p),
        "gt" => compare(constraint.param, value, |m, p| m > p),
        "gte" => compare(constraint.param, value, |m, p| m >= p),
        "lt" => compare(constraint.param, value, |m, p| m < p),
        "lte" => compare(constraint.param, value, |m, p| m <= p),
        "eq" => equals(constraint.param, value),
        "ne" => match equals(constraint.param, value) {
            Check::Pass => Check::Fail,
            Check::Fail => Check::Pass,
            Check::Unsupported => Check::Unsupported,
        },
        "email" => matches_str(value, |s| EMAIL_REGEX.is_match(s)),
        "uuid" => matches_str(value, |s| s.len() == 36 && Uuid::parse_str(s).is_ok()),
        "url" => matches_str(value, |s| {
            url::Url::parse(s).map(|u| !u.scheme().is_empty()).unwrap_or(false)
        }),
        "numeric" => match value {
            Value::Number(_) => Check::Pass,
            other => matches_str(other, |s| NUMERIC_REGEX.is_match(s)),
        },
        "alphanum" => matches_str(value, |s| ALPHANUM_REGEX.is_match(s)),
        "boolean" => match value {
            Value::Bool(_) => Check::Pass,
            Value::String(s) => parse_bool(s).is_some().into(),
            _ => Check::Fail,
        },
        "oneof" => one_of(constraint.param, value),
        _ => Check::Unsupported,
    }
}

/// Measure a value: characters for strings, value for numbers, length for lists
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Number(n) => n.as_f64(),
        Value::Array(items) => Some(items.len() as f64),
        _ => None,
    }
}

fn compare(param: Option<&str>, value: &Value, op: impl Fn(f64, f64) -> bool) -> Check {
    let Some(limit) = param.and_then(|p| p.parse::<f64>().ok()) else {
        return Check::Unsupported;
    };
    match measure(value) {
        Some(m) => op(m, limit).into(),
        None => Check::Fail,
    }
}

fn equals(param: Option<&str>, value: &Value) -> Check {
    let Some(param) = param else {
        return Check::Unsupported;
    };
    match value {
        Value::String(s) => (s.as_str() == param).into(),
        Value::Bool(b) => match parse_bool(param) {
            Some(expected) => (*b == expected).into(),
            None => Check::Unsupported,
        },
        other => compare(Some(param), other, |m, p| m == p),
    }
}

fn one_of(param: Option<&str>, value: &Value) -> Check {
    let Some(param) = param else {
        return Check::Unsupported;
    };
    let mut options = param.split_whitespace();
    match value {
        Value::String(s) => options.any(|o| o == s.as_str()).into(),
        Value::Number(n) => {
            let rendered = n.to_string();
            options.any(|o| o == rendered).into()
        }
        _ => Check::Fail,
    }
}

fn matches_str(value: &Value, pred: impl Fn(&str) -> bool) -> Check {
    match value {
        Value::String(s) => pred(s).into(),
        _ => Check::Fail,
    }
}
