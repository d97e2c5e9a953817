//! Structural path → wire path resolution
//!
//! Violations name fields by internal identifier (`roles[0].name`); clients
//! know them by the keys they submitted (`roles.0.name`, or whatever the
//! field declares). [`resolve`] walks the violation path through the
//! record's shape and emits the declared wire name of each segment.

use crate::shape::{Naming, Shape};

/// Resolve a structural violation path into the dotted wire path.
///
/// Segments that name no field of the current shape are skipped, so a
/// partially matching path still yields a useful prefix.
pub fn resolve(shape: &Shape, path: &str, naming: Naming) -> String {
    let mut resolved: Vec<String> = Vec::new();
    let mut current: Option<&Shape> = Some(shape);

    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let (name, indices) = split_indices(segment);

        let Some(field) = current.and_then(|shape| shape.field(name)) else {
            continue;
        };

        let mut rendered = field.external_name(naming).to_string();
        for index in indices {
            rendered.push('.');
            rendered.push_str(index);
        }
        resolved.push(rendered);

        current = field.kind().nested_shape();
    }

    resolved.join(".")
}

/// Split `name[0][1]` into `name` and its index list
fn split_indices(segment: &str) -> (&str, Vec<&str>) {
    let Some(open) = segment.find('[') else {
        return (segment, Vec::new());
    };

    let name = &segment[..open];
    let indices = segment[open..]
        .split('[')
        .filter_map(|part| part.strip_suffix(']'))
        .collect();
    (name, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Field, ScalarType};
    use once_cell::sync::Lazy;

    fn role_shape() -> &'static Shape {
        static SHAPE: Lazy<Shape> = Lazy::new(|| {
            Shape::builder("Role")
                .field(Field::scalar("name", ScalarType::String).json("name").form("role_name"))
                .build()
        });
        &SHAPE
    }

    fn meta_shape() -> &'static Shape {
        static SHAPE: Lazy<Shape> = Lazy::new(|| {
            Shape::builder("Meta")
                .field(Field::scalar("note", ScalarType::String).json("note"))
                .build()
        });
        &SHAPE
    }

    fn root_shape() -> Shape {
        Shape::builder("UserRequest")
            .field(Field::scalar("note", ScalarType::String).json("note"))
            .field(Field::scalar("no_tag", ScalarType::String))
            .field(Field::scalar("ignored", ScalarType::String).json("-"))
            .field(Field::records("roles", role_shape).json("roles").form("roles"))
            .field(Field::optional_record("meta", meta_shape).json("meta"))
            .field(Field::list("permission_ids", ScalarType::String).json("permissionIds"))
            .build()
    }

    #[test]
    fn test_root_level() {
        let shape = root_shape();
        assert_eq!(resolve(&shape, "note", Naming::Json), "note");
        assert_eq!(resolve(&shape, "no_tag", Naming::Json), "no_tag");
        assert_eq!(resolve(&shape, "ignored", Naming::Json), "ignored");
    }

    #[test]
    fn test_slice_element_keeps_index() {
        let shape = root_shape();
        assert_eq!(resolve(&shape, "roles[0].name", Naming::Json), "roles.0.name");
        assert_eq!(resolve(&shape, "roles[12].name", Naming::Form), "roles.12.role_name");
        assert_eq!(resolve(&shape, "permission_ids[3]", Naming::Json), "permissionIds.3");
    }

    #[test]
    fn test_optional_record_descends() {
        let shape = root_shape();
        assert_eq!(resolve(&shape, "meta.note", Naming::Json), "meta.note");
        // no form name declared anywhere: identifiers throughout
        assert_eq!(resolve(&shape, "meta.note", Naming::Form), "meta.note");
    }

    #[test]
    fn test_unknown_segments_are_skipped() {
        let shape = root_shape();
        assert_eq!(resolve(&shape, "UserRequest.roles[1].name", Naming::Json), "roles.1.name");
        assert_eq!(resolve(&shape, "roles[0].missing", Naming::Json), "roles.0");
        assert_eq!(resolve(&shape, "note.deeper", Naming::Json), "note");
        assert_eq!(resolve(&shape, "", Naming::Json), "");
    }

    #[test]
    fn test_split_indices() {
        assert_eq!(split_indices("roles"), ("roles", vec![]));
        assert_eq!(split_indices("roles[0]"), ("roles", vec!["0"]));
        assert_eq!(split_indices("grid[1][2]"), ("grid", vec!["1", "2"]));
    }
}
