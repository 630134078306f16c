//! Leaf mapping: primitive and well-known kinds to their schema fragment,
//! behind the caller's override hook.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::describe::{Kind, TypeDesc};
use crate::schema::{InstanceType, Media, Schema};

/// Outcome of consulting a `TypeMapper`.
#[derive(Debug, Clone)]
pub enum Mapping {
    /// Fall through to the built-in mapping.
    Default,
    /// Use this fragment verbatim; the type is not walked.
    Replace(Schema),
    /// The type cannot be represented; reflection fails.
    Reject(String),
}

/// Caller-supplied override consulted before the built-in mapping for every
/// type. Must be pure: one mapper may serve concurrent reflections.
#[derive(Clone)]
pub struct TypeMapper(Arc<dyn Fn(&TypeDesc) -> Mapping + Send + Sync>);

impl TypeMapper {
    pub fn new(f: impl Fn(&TypeDesc) -> Mapping + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn map(&self, desc: &TypeDesc) -> Mapping {
        (self.0)(desc)
    }
}

impl fmt::Debug for TypeMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeMapper(..)")
    }
}

/// Built-in fragment for a leaf kind, or `None` for structural kinds the
/// walker handles itself.
pub fn leaf_schema(kind: &Kind) -> Option<Schema> {
    let schema = match kind {
        Kind::Bool => Schema::typed(InstanceType::Boolean),
        Kind::Integer => Schema::typed(InstanceType::Integer),
        Kind::Float => Schema::typed(InstanceType::Number),
        Kind::String => Schema::typed(InstanceType::String),
        Kind::Bytes => Schema {
            media: Some(Media { binary_encoding: "base64".to_string() }),
            ..Schema::typed(InstanceType::String)
        },
        Kind::Timestamp => Schema::formatted(InstanceType::String, "date-time"),
        Kind::Uri => Schema::formatted(InstanceType::String, "uri"),
        Kind::IpAddr => Schema::formatted(InstanceType::String, "ipv4"),
        Kind::Enumeration(variants) => Schema {
            enum_values: variants.iter().map(|v| Value::from(*v)).collect(),
            ..Schema::typed(InstanceType::String)
        },
        Kind::Any => Schema::any(),
        Kind::Array { .. }
        | Kind::Map { .. }
        | Kind::Optional(_)
        | Kind::Pointer(_)
        | Kind::Record(_)
        | Kind::Unsupported(_) => return None,
    };
    Some(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::Describe;
    use serde_json::json;

    fn leaf<T: Describe>() -> Value {
        serde_json::to_value(leaf_schema(&T::describe().kind).unwrap()).unwrap()
    }

    #[test]
    fn primitive_table() {
        assert_eq!(leaf::<bool>(), json!({"type": "boolean"}));
        assert_eq!(leaf::<u16>(), json!({"type": "integer"}));
        assert_eq!(leaf::<i64>(), json!({"type": "integer"}));
        assert_eq!(leaf::<f32>(), json!({"type": "number"}));
        assert_eq!(leaf::<String>(), json!({"type": "string"}));
        assert_eq!(leaf::<Vec<u8>>(), json!({"type": "string", "media": {"binaryEncoding": "base64"}}));
        assert_eq!(leaf::<chrono::DateTime<chrono::Utc>>(), json!({"type": "string", "format": "date-time"}));
        assert_eq!(leaf::<url::Url>(), json!({"type": "string", "format": "uri"}));
        assert_eq!(leaf::<std::net::IpAddr>(), json!({"type": "string", "format": "ipv4"}));
        assert_eq!(leaf::<serde_json::Value>(), json!({}));
    }

    #[test]
    fn enumerations_render_symbolic_names() {
        struct Feeling;
        let desc = TypeDesc::enumeration::<Feeling>("Feeling", &["Unset", "Great"]);
        let value = serde_json::to_value(leaf_schema(&desc.kind).unwrap()).unwrap();
        assert_eq!(value, json!({"type": "string", "enum": ["Unset", "Great"]}));
    }

    #[test]
    fn structural_kinds_are_not_leaves() {
        assert!(leaf_schema(&Vec::<String>::describe().kind).is_none());
        assert!(leaf_schema(&Option::<bool>::describe().kind).is_none());
    }

    #[test]
    fn mapper_is_shared_across_threads() {
        let mapper = TypeMapper::new(|desc| {
            if desc.is::<bool>() { Mapping::Replace(Schema::typed(InstanceType::String)) } else { Mapping::Default }
        });
        let other = mapper.clone();
        let handle = std::thread::spawn(move || matches!(other.map(&bool::describe()), Mapping::Replace(_)));
        assert!(handle.join().unwrap());
        assert!(matches!(mapper.map(&i32::describe()), Mapping::Default));
    }
}
