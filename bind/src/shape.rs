//! Record shape descriptions
//!
//! A [`Shape`] is the static description of a request record: its fields,
//! their wire names for JSON and form encodings, their declared kinds and
//! the constraints attached to them. Shapes are built once per record type
//! and cached, so every lookup made during binding and validation is a
//! read of immutable data.
//!
//! ```ignore
//! use once_cell::sync::Lazy;
//! use reqbind::{Field, Record, ScalarType, Shape};
//!
//! #[derive(Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct CreateUser {
//!     name: String,
//!     age: i32,
//! }
//!
//! impl Record for CreateUser {
//!     fn shape() -> &'static Shape {
//!         static SHAPE: Lazy<Shape> = Lazy::new(|| {
//!             Shape::builder("CreateUser")
//!                 .field(Field::scalar("name", ScalarType::String).json("name").rules("required,max=100"))
//!                 .field(Field::scalar("age", ScalarType::I32).json("age").rules("min=18"))
//!                 .build()
//!         });
//!         &SHAPE
//!     }
//! }
//! ```

use serde::{de::DeserializeOwned, Serialize};

use crate::rules::Constraint;

/// Marker used in a name declaration to suppress the wire name.
pub const SUPPRESSED: &str = "-";

/// Lazily resolved reference to another record's shape.
pub type ShapeFn = fn() -> &'static Shape;

/// A request record with a static shape description.
///
/// The serde key of every field must equal its JSON external name, and the
/// type should carry `#[serde(default)]` so keys absent from a request
/// leave the field at its default value.
pub trait Record: Serialize + DeserializeOwned {
    fn shape() -> &'static Shape;
}

/// Which wire encoding a name is looked up for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    Json,
    Form,
}

/// Scalar types a field (or list element) can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
}

impl ScalarType {
    /// Rust spelling of the type, used in type-mismatch messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
            ScalarType::Bool => "bool",
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            ScalarType::I8 | ScalarType::I16 | ScalarType::I32 | ScalarType::I64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            ScalarType::U8 | ScalarType::U16 | ScalarType::U32 | ScalarType::U64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// Inclusive range of a signed integer type
    pub fn signed_range(&self) -> Option<(i64, i64)> {
        match self {
            ScalarType::I8 => Some((i8::MIN as i64, i8::MAX as i64)),
            ScalarType::I16 => Some((i16::MIN as i64, i16::MAX as i64)),
            ScalarType::I32 => Some((i32::MIN as i64, i32::MAX as i64)),
            ScalarType::I64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Upper bound of an unsigned integer type
    pub fn unsigned_max(&self) -> Option<u64> {
        match self {
            ScalarType::U8 => Some(u8::MAX as u64),
            ScalarType::U16 => Some(u16::MAX as u64),
            ScalarType::U32 => Some(u32::MAX as u64),
            ScalarType::U64 => Some(u64::MAX),
            _ => None,
        }
    }
}

/// Declared kind of a record field
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// `T`
    Scalar(ScalarType),
    /// `Option<T>`
    Optional(ScalarType),
    /// Nested record
    Record(ShapeFn),
    /// `Option<Record>`
    OptionalRecord(ShapeFn),
    /// `Vec<T>`
    List(ScalarType),
    /// `Vec<Record>`
    RecordList(ShapeFn),
    /// `Option<FileAttachment>`
    File,
    /// `Vec<FileAttachment>`
    FileList,
}

impl FieldKind {
    /// Display name of the declared type
    pub fn type_name(&self) -> String {
        match self {
            FieldKind::Scalar(ty) => ty.display_name().to_string(),
            FieldKind::Optional(ty) => format!("Option<{}>", ty.display_name()),
            FieldKind::Record(shape) => shape().name().to_string(),
            FieldKind::OptionalRecord(shape) => format!("Option<{}>", shape().name()),
            FieldKind::List(ty) => format!("Vec<{}>", ty.display_name()),
            FieldKind::RecordList(shape) => format!("Vec<{}>", shape().name()),
            FieldKind::File => "Option<FileAttachment>".to_string(),
            FieldKind::FileList => "Vec<FileAttachment>".to_string(),
        }
    }

    /// Shape a path cursor descends into after this field
    pub fn nested_shape(&self) -> Option<&'static Shape> {
        match self {
            FieldKind::Record(shape)
            | FieldKind::OptionalRecord(shape)
            | FieldKind::RecordList(shape) => Some(shape()),
            _ => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, FieldKind::File | FieldKind::FileList)
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            FieldKind::List(_) | FieldKind::RecordList(_) | FieldKind::FileList
        )
    }

    /// Whether `null` is a meaningful value (as opposed to "leave default")
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            FieldKind::Optional(_) | FieldKind::OptionalRecord(_) | FieldKind::File
        )
    }
}

impl std::fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// One field of a record shape
#[derive(Debug, Clone)]
pub struct Field {
    ident: &'static str,
    json: Option<&'static str>,
    form: Option<&'static str>,
    kind: FieldKind,
    constraints: Vec<Constraint>,
}

impl Field {
    pub fn new(ident: &'static str, kind: FieldKind) -> Self {
        Self {
            ident,
            json: None,
            form: None,
            kind,
            constraints: Vec::new(),
        }
    }

    pub fn scalar(ident: &'static str, ty: ScalarType) -> Self {
        Self::new(ident, FieldKind::Scalar(ty))
    }

    pub fn optional(ident: &'static str, ty: ScalarType) -> Self {
        Self::new(ident, FieldKind::Optional(ty))
    }

    pub fn record(ident: &'static str, shape: ShapeFn) -> Self {
        Self::new(ident, FieldKind::Record(shape))
    }

    pub fn optional_record(ident: &'static str, shape: ShapeFn) -> Self {
        Self::new(ident, FieldKind::OptionalRecord(shape))
    }

    pub fn list(ident: &'static str, ty: ScalarType) -> Self {
        Self::new(ident, FieldKind::List(ty))
    }

    pub fn records(ident: &'static str, shape: ShapeFn) -> Self {
        Self::new(ident, FieldKind::RecordList(shape))
    }

    pub fn file(ident: &'static str) -> Self {
        Self::new(ident, FieldKind::File)
    }

    pub fn files(ident: &'static str) -> Self {
        Self::new(ident, FieldKind::FileList)
    }

    /// Declare the JSON key
    pub fn json(mut self, name: &'static str) -> Self {
        self.json = Some(name);
        self
    }

    /// Declare the form key
    pub fn form(mut self, name: &'static str) -> Self {
        self.form = Some(name);
        self
    }

    /// Attach a constraint tag, e.g. `"required,min=18"`
    pub fn rules(mut self, tag: &'static str) -> Self {
        self.constraints.extend(Constraint::parse_tag(tag));
        self
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The declared wire name, or `None` when undeclared, empty or suppressed
    pub fn declared_name(&self, naming: Naming) -> Option<&'static str> {
        let declared = match naming {
            Naming::Json => self.json,
            Naming::Form => self.form,
        };
        declared.filter(|name| !name.is_empty() && *name != SUPPRESSED)
    }

    /// The wire name clients see, falling back to the identifier
    pub fn external_name(&self, naming: Naming) -> &'static str {
        self.declared_name(naming).unwrap_or(self.ident)
    }

    /// The key this field occupies in the record's serde form
    pub fn serde_key(&self) -> &'static str {
        self.external_name(Naming::Json)
    }
}

/// Static description of a record type
#[derive(Debug, Clone)]
pub struct Shape {
    name: &'static str,
    fields: Vec<Field>,
}

impl Shape {
    pub fn builder(name: &'static str) -> ShapeBuilder {
        ShapeBuilder {
            name,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by internal identifier
    pub fn field(&self, ident: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.ident == ident)
    }

    /// Look up a field by the key it occupies in a JSON body
    pub fn field_by_json_key(&self, key: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.json != Some(SUPPRESSED) && f.serde_key() == key)
    }
}

pub struct ShapeBuilder {
    name: &'static str,
    fields: Vec<Field>,
}

impl ShapeBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Shape {
        Shape {
            name: self.name,
            fields: self.fields,
        }
    }
}
