//! Form and multipart body decoding

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::error::DecodeError;
use crate::file::{self, FileAttachment};
use crate::rules::parse_bool;
use crate::shape::{FieldKind, Naming, Record, ScalarType};

/// Submitted form data: a multi-valued key list and, for multipart bodies,
/// the uploaded files grouped by part name.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    values: HashMap<String, Vec<String>>,
    files: Option<HashMap<String, Vec<FileAttachment>>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty form data with a (so far empty) file set
    pub fn multipart() -> Self {
        Self {
            values: HashMap::new(),
            files: Some(HashMap::new()),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body
    pub fn from_urlencoded(body: &[u8]) -> Result<Self, DecodeError> {
        let mut form = Self::new();
        parse_pairs(body, &mut form.values)?;
        Ok(form)
    }

    /// Append query string values after the body values
    pub fn merge_query(&mut self, query: &str) -> Result<(), DecodeError> {
        parse_pairs(query.as_bytes(), &mut self.values)
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Add an uploaded file. The form becomes multipart if it was not.
    pub fn attach(&mut self, key: impl Into<String>, file: FileAttachment) -> &mut Self {
        self.files
            .get_or_insert_with(HashMap::new)
            .entry(key.into())
            .or_default()
            .push(file);
        self
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn files(&self, key: &str) -> Option<&[FileAttachment]> {
        self.files.as_ref()?.get(key).map(Vec::as_slice)
    }

    pub fn is_multipart(&self) -> bool {
        self.files.is_some()
    }
}

fn parse_pairs(input: &[u8], into: &mut HashMap<String, Vec<String>>) -> Result<(), DecodeError> {
    let text = std::str::from_utf8(input)
        .map_err(|_| DecodeError::syntax("form data is not valid UTF-8"))?;
    check_escapes(text)?;

    for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
        into.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    Ok(())
}

/// `form_urlencoded` passes malformed escapes through untouched, so they
/// are rejected up front.
fn check_escapes(text: &str) -> Result<(), DecodeError> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = bytes[start..].iter().position(|b| *b == b'%') {
        let at = start + offset;
        let valid = bytes
            .get(at + 1..at + 3)
            .map_or(false, |hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(DecodeError::syntax(format!("invalid escape at byte {}", at)));
        }
        start = at + 3;
    }
    Ok(())
}

/// The offending raw value of a failed coercion
struct Unconvertible(String);

/// Bind form data onto `T`.
///
/// Only fields with a declared form name are bound. Keys that were not
/// submitted leave their field at its default.
pub fn decode<T: Record>(form: &FormData) -> Result<T, DecodeError> {
    file::with_handoff(|| decode_inner(form))
}

fn decode_inner<T: Record>(form: &FormData) -> Result<T, DecodeError> {
    let shape = T::shape();
    let mut object = Map::new();

    for field in shape.fields() {
        let Some(name) = field.declared_name(Naming::Form) else {
            continue;
        };
        let kind = field.kind();

        let bound = if kind.is_file() {
            bind_files(kind, name, form.files(name))?
        } else {
            match form.values(name) {
                Some(raw) if !raw.is_empty() => coerce_field(kind, raw).map_err(|Unconvertible(got)| {
                    DecodeError::type_mismatch(name, kind.type_name(), got)
                })?,
                _ => None,
            }
        };

        if let Some(value) = bound {
            object.insert(field.serde_key().to_string(), value);
        }
    }

    serde_json::from_value(Value::Object(object)).map_err(DecodeError::Data)
}

fn coerce_field(kind: &FieldKind, raw: &[String]) -> Result<Option<Value>, Unconvertible> {
    let first = &raw[0];
    match kind {
        FieldKind::Scalar(ty) => coerce_scalar(*ty, first),
        FieldKind::Optional(_) if first.is_empty() => Ok(None),
        FieldKind::Optional(ty) => coerce_scalar(*ty, first),
        FieldKind::List(ScalarType::String) => Ok(Some(Value::Array(
            raw.iter().cloned().map(Value::String).collect(),
        ))),
        FieldKind::List(ty) => {
            let items = raw
                .iter()
                .map(|item| coerce_scalar(*ty, item).map(|v| v.unwrap_or_else(|| zero_value(*ty))))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(Value::Array(items)))
        }
        // flat form values cannot populate a nested record
        FieldKind::Record(_) | FieldKind::OptionalRecord(_) | FieldKind::RecordList(_) => {
            Err(Unconvertible(first.clone()))
        }
        FieldKind::File | FieldKind::FileList => Ok(None),
    }
}

/// `Ok(None)` leaves the field at its default
fn coerce_scalar(ty: ScalarType, raw: &str) -> Result<Option<Value>, Unconvertible> {
    if ty == ScalarType::String {
        return Ok(Some(Value::String(raw.to_string())));
    }
    if raw.is_empty() {
        return Ok(None);
    }

    let unconvertible = || Unconvertible(raw.to_string());
    let value = if ty == ScalarType::Bool {
        parse_bool(raw).map(Value::Bool)
    } else if ty == ScalarType::F32 {
        raw.parse::<f32>().ok().and_then(|n| Number::from_f64(n.into())).map(Value::Number)
    } else if ty.is_float() {
        raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
    } else if let Some((min, max)) = ty.signed_range() {
        raw.parse::<i64>()
            .ok()
            .filter(|n| *n >= min && *n <= max)
            .map(Value::from)
    } else if let Some(max) = ty.unsigned_max() {
        raw.parse::<u64>().ok().filter(|n| *n <= max).map(Value::from)
    } else {
        None
    };

    value.map(Some).ok_or_else(unconvertible)
}

fn zero_value(ty: ScalarType) -> Value {
    match ty {
        ScalarType::String => Value::String(String::new()),
        ScalarType::Bool => Value::Bool(false),
        ScalarType::F32 | ScalarType::F64 => Value::from(0.0),
        _ => Value::from(0),
    }
}

fn bind_files(
    kind: &FieldKind,
    name: &str,
    files: Option<&[FileAttachment]>,
) -> Result<Option<Value>, DecodeError> {
    let Some(files) = files.filter(|files| !files.is_empty()) else {
        return Ok(None);
    };

    let value = match kind {
        FieldKind::File => serde_json::to_value(&files[0]),
        FieldKind::FileList => serde_json::to_value(files),
        _ => return Ok(None),
    };

    value.map(Some).map_err(|err| DecodeError::FileBinding {
        field: name.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Field, Shape};
    use once_cell::sync::Lazy;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Profile {
        name: String,
        age: i32,
        nickname: Option<String>,
        score: Option<f64>,
        active: bool,
        tags: Vec<String>,
        ids: Vec<u16>,
        internal: String,
        avatar: Option<FileAttachment>,
        documents: Vec<FileAttachment>,
    }

    impl Record for Profile {
        fn shape() -> &'static Shape {
            static SHAPE: Lazy<Shape> = Lazy::new(|| {
                Shape::builder("Profile")
                    .field(Field::scalar("name", ScalarType::String).form("name"))
                    .field(Field::scalar("age", ScalarType::I32).form("age"))
                    .field(Field::optional("nickname", ScalarType::String).form("nick"))
                    .field(Field::optional("score", ScalarType::F64).form("score"))
                    .field(Field::scalar("active", ScalarType::Bool).form("active"))
                    .field(Field::list("tags", ScalarType::String).form("tag"))
                    .field(Field::list("ids", ScalarType::U16).form("id"))
                    .field(Field::scalar("internal", ScalarType::String).form("-"))
                    .field(Field::file("avatar").form("avatar"))
                    .field(Field::files("documents").form("documents"))
                    .build()
            });
            &SHAPE
        }
    }

    fn mismatch_of(result: Result<Profile, DecodeError>) -> (String, String, String) {
        match result {
            Err(DecodeError::TypeMismatch { field, expected, got }) => (field, expected, got),
            other => panic!("expected a type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_urlencoded_parsing() {
        let form = FormData::from_urlencoded(b"name=Ada+Lovelace&tag=a&tag=b%20c").unwrap();
        assert_eq!(form.values("name"), Some(&["Ada Lovelace".to_string()][..]));
        assert_eq!(form.values("tag").map(<[String]>::len), Some(2));
        assert!(!form.is_multipart());
    }

    #[test]
    fn test_malformed_escapes_are_syntax_errors() {
        assert!(matches!(FormData::from_urlencoded(b"name=%zz"), Err(DecodeError::Syntax { .. })));
        assert!(matches!(FormData::from_urlencoded(b"name=100%"), Err(DecodeError::Syntax { .. })));
        assert!(matches!(FormData::from_urlencoded(&[0x6e, 0x3d, 0xff]), Err(DecodeError::Syntax { .. })));
    }

    #[test]
    fn test_query_values_follow_body_values() {
        let mut form = FormData::from_urlencoded(b"tag=body").unwrap();
        form.merge_query("tag=query&age=4").unwrap();
        assert_eq!(
            form.values("tag"),
            Some(&["body".to_string(), "query".to_string()][..])
        );

        let profile: Profile = decode(&form).unwrap();
        assert_eq!(profile.age, 4);
    }

    #[test]
    fn test_scalar_coercion() {
        let form = FormData::from_urlencoded(b"name=Ada&age=36&active=T&nick=ada&score=9.5").unwrap();
        let profile: Profile = decode(&form).unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.age, 36);
        assert!(profile.active);
        assert_eq!(profile.nickname.as_deref(), Some("ada"));
        assert_eq!(profile.score, Some(9.5));
    }

    #[test]
    fn test_empty_values_leave_defaults() {
        let form = FormData::from_urlencoded(b"age=&nick=&score=&active=").unwrap();
        let profile: Profile = decode(&form).unwrap();
        assert_eq!(profile.age, 0);
        assert_eq!(profile.nickname, None);
        assert_eq!(profile.score, None);
        assert!(!profile.active);
    }

    #[test]
    fn test_unparsable_values_are_type_mismatches() {
        let form = FormData::from_urlencoded(b"age=old").unwrap();
        assert_eq!(
            mismatch_of(decode(&form)),
            ("age".to_string(), "i32".to_string(), "old".to_string())
        );

        let form = FormData::from_urlencoded(b"active=yes").unwrap();
        assert_eq!(mismatch_of(decode(&form)).1, "bool");

        let form = FormData::from_urlencoded(b"score=NaN").unwrap();
        assert_eq!(mismatch_of(decode(&form)).1, "Option<f64>");

        let form = FormData::from_urlencoded(b"score=-inf").unwrap();
        assert_eq!(mismatch_of(decode(&form)).1, "Option<f64>");

        let form = FormData::from_urlencoded(b"age=3000000000").unwrap();
        assert_eq!(mismatch_of(decode(&form)).0, "age");
    }

    #[test]
    fn test_lists() {
        let form = FormData::from_urlencoded(b"tag=&tag=x&id=1&id=&id=3").unwrap();
        let profile: Profile = decode(&form).unwrap();
        assert_eq!(profile.tags, vec!["".to_string(), "x".to_string()]);
        assert_eq!(profile.ids, vec![1, 0, 3]);

        let form = FormData::from_urlencoded(b"id=1&id=70000").unwrap();
        assert_eq!(
            mismatch_of(decode(&form)),
            ("id".to_string(), "Vec<u16>".to_string(), "70000".to_string())
        );
    }

    #[test]
    fn test_fields_without_form_name_are_not_bound() {
        let form = FormData::from_urlencoded(b"internal=x&-=y").unwrap();
        let profile: Profile = decode(&form).unwrap();
        assert_eq!(profile.internal, "");
    }

    #[test]
    fn test_file_binding() {
        let mut form = FormData::multipart();
        form.attach("avatar", FileAttachment::new("a.png", None, b"one".to_vec()))
            .attach("avatar", FileAttachment::new("b.png", None, b"two".to_vec()))
            .attach("documents", FileAttachment::new("c.pdf", None, b"three".to_vec()))
            .attach("documents", FileAttachment::new("d.pdf", None, b"four".to_vec()));

        let profile: Profile = decode(&form).unwrap();
        assert_eq!(profile.avatar.map(|f| f.file_name), Some("a.png".to_string()));
        assert_eq!(
            profile.documents.iter().map(|f| f.file_name.as_str()).collect::<Vec<_>>(),
            vec!["c.pdf", "d.pdf"]
        );
    }

    #[test]
    fn test_files_ignored_without_multipart() {
        let mut form = FormData::new();
        form.append("avatar", "not-a-file");
        let profile: Profile = decode(&form).unwrap();
        assert!(profile.avatar.is_none());
        assert!(profile.documents.is_empty());
    }
}
