//! JSON body decoding
//!
//! Decoding is strict and shape driven: the body is parsed into a JSON
//! value, every key is checked against the record's shape (unknown keys
//! and values of the wrong type are rejected with their wire path), and
//! only then is the value handed to serde.

use serde_json::{error::Category, Map, Value};

use crate::error::DecodeError;
use crate::file;
use crate::shape::{FieldKind, Record, ScalarType, Shape};

/// Decode a JSON body into `T`
pub fn decode<T: Record>(body: &[u8]) -> Result<T, DecodeError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::EmptyBody);
    }

    let mut value: Value = serde_json::from_slice(body).map_err(classify)?;
    match &mut value {
        Value::Object(map) => check_object(T::shape(), map, "")?,
        other => {
            return Err(DecodeError::Structural(format!(
                "expected a JSON object, found {}",
                describe(other)
            )))
        }
    }

    serde_json::from_value(value).map_err(DecodeError::Data)
}

fn classify(err: serde_json::Error) -> DecodeError {
    match err.classify() {
        Category::Io => DecodeError::Io(err.into()),
        Category::Syntax | Category::Eof => DecodeError::syntax(err.to_string()),
        Category::Data => DecodeError::Data(err),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Check an object against a shape. `null` on a field that cannot hold it
/// is dropped so the field keeps its default.
fn check_object(shape: &Shape, map: &mut Map<String, Value>, prefix: &str) -> Result<(), DecodeError> {
    let keys: Vec<String> = map.keys().cloned().collect();

    for key in keys {
        let path = join(prefix, &key);
        let Some(field) = shape.field_by_json_key(&key) else {
            return Err(DecodeError::UnknownField { field: path });
        };

        let is_null = map.get(&key).map_or(true, Value::is_null);
        if is_null {
            if !field.kind().is_nullable() {
                map.remove(&key);
            }
            continue;
        }

        if let Some(value) = map.get_mut(&key) {
            check_value(field.kind(), value, &path)?;
        }
    }

    Ok(())
}

fn check_value(kind: &FieldKind, value: &mut Value, path: &str) -> Result<(), DecodeError> {
    match kind {
        FieldKind::Scalar(ty) | FieldKind::Optional(ty) => check_scalar(*ty, value, path),
        FieldKind::Record(shape) | FieldKind::OptionalRecord(shape) => match value {
            Value::Object(map) => check_object(shape(), map, path),
            other => Err(mismatch(path, shape().name(), other)),
        },
        FieldKind::List(ty) => match value {
            Value::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    if item.is_null() {
                        *item = zero_value(*ty);
                        continue;
                    }
                    check_scalar(*ty, item, &join(path, &index.to_string()))?;
                }
                Ok(())
            }
            other => Err(mismatch(path, &kind.type_name(), other)),
        },
        FieldKind::RecordList(shape) => match value {
            Value::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    if item.is_null() {
                        *item = Value::Object(Map::new());
                        continue;
                    }
                    let item_path = join(path, &index.to_string());
                    match item {
                        Value::Object(map) => check_object(shape(), map, &item_path)?,
                        other => return Err(mismatch(&item_path, shape().name(), other)),
                    }
                }
                Ok(())
            }
            other => Err(mismatch(path, &kind.type_name(), other)),
        },
        FieldKind::File => check_attachment(value, path),
        FieldKind::FileList => match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    check_attachment(item, &join(path, &index.to_string()))?;
                }
                Ok(())
            }
            other => Err(mismatch(path, &kind.type_name(), other)),
        },
    }
}

const ATTACHMENT: &str = "FileAttachment";

/// An attachment object may carry any subset of its members; each present
/// member must have the member's type and content must be valid base64.
fn check_attachment(value: &Value, path: &str) -> Result<(), DecodeError> {
    let Value::Object(map) = value else {
        return Err(mismatch(path, ATTACHMENT, value));
    };

    for (key, member) in map {
        let fits = match key.as_str() {
            "file_name" => member.is_string(),
            "content_type" => member.is_string() || member.is_null(),
            "size" => member.is_u64(),
            "content" => member.as_str().map_or(false, file::is_encoded_content),
            _ => {
                return Err(DecodeError::UnknownField {
                    field: join(path, key),
                })
            }
        };
        if !fits {
            return Err(mismatch(path, ATTACHMENT, value));
        }
    }

    Ok(())
}

fn check_scalar(ty: ScalarType, value: &Value, path: &str) -> Result<(), DecodeError> {
    let fits = match ty {
        ScalarType::String => value.is_string(),
        ScalarType::Bool => value.is_boolean(),
        ScalarType::F32 => value
            .as_f64()
            .map_or(false, |n| n >= f32::MIN as f64 && n <= f32::MAX as f64),
        ScalarType::F64 => value.is_number(),
        _ if ty.is_signed() => match (value.as_i64(), ty.signed_range()) {
            (Some(n), Some((min, max))) => n >= min && n <= max,
            _ => false,
        },
        _ => match (value.as_u64(), ty.unsigned_max()) {
            (Some(n), Some(max)) => n <= max,
            _ => false,
        },
    };

    if fits {
        Ok(())
    } else {
        Err(mismatch(path, ty.display_name(), value))
    }
}

fn zero_value(ty: ScalarType) -> Value {
    match ty {
        ScalarType::String => Value::String(String::new()),
        ScalarType::Bool => Value::Bool(false),
        ScalarType::F32 | ScalarType::F64 => Value::from(0.0),
        _ => Value::from(0),
    }
}

fn mismatch(path: &str, expected: &str, got: &Value) -> DecodeError {
    DecodeError::type_mismatch(path, expected, describe(got))
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}
