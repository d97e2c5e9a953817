//! Violation → human-readable message

use crate::engine::Violation;

/// Message for a violation. Total: kinds without a dedicated message read
/// `"field is invalid"`.
pub fn message(violation: &Violation) -> String {
    let param = violation.param.as_deref().unwrap_or_default();
    match violation.tag.as_str() {
        "required" => "field is required".to_string(),
        "email" => "field must be a valid email address".to_string(),
        "max" => format!("maximum length is {}", param),
        "min" => format!("minimum value is {}", param),
        "boolean" => "field must be a boolean".to_string(),
        "oneof" => format!(
            "field must be one of: {}",
            param.split(' ').collect::<Vec<_>>().join(", ")
        ),
        "uuid" => "field must be a valid UUID".to_string(),
        _ => "field is invalid".to_string(),
    }
}
