//! Recursive descent over type descriptors.

use std::any::TypeId;
use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::describe::{FieldDesc, Kind, TypeDesc};
use crate::error::{ReflectError, ReflectResult};
use crate::reflect::ReflectorConfig;
use crate::registry::{DefinitionRegistry, Resolution};
use crate::resolve::{self, Mapping};
use crate::schema::{InstanceType, Schema};

pub(crate) struct Walker<'c> {
    pub(super) config: &'c ReflectorConfig,
    registry: DefinitionRegistry,
    /// Anonymous records currently being inlined.
    inlining: Vec<TypeId>,
}

impl<'c> Walker<'c> {
    pub(crate) fn new(config: &'c ReflectorConfig) -> Self {
        Self { config, registry: DefinitionRegistry::new(), inlining: Vec::new() }
    }

    pub(crate) fn into_definitions(self) -> BTreeMap<String, Schema> {
        self.registry.into_definitions()
    }

    /// Structural schema for `desc`: override, then leaf table, then shape.
    pub(crate) fn schema_for(&mut self, desc: &TypeDesc, path: &str) -> ReflectResult<Schema> {
        if let Some(schema) = self.mapped(desc, path)? {
            return Ok(schema);
        }
        if let Some(schema) = resolve::leaf_schema(&desc.kind) {
            return Ok(schema);
        }
        match &desc.kind {
            Kind::Optional(inner) | Kind::Pointer(inner) => self.schema_for(&inner.get(), path),
            Kind::Array { items, len } => {
                let items = self.schema_for(&items.get(), &format!("{path}[]"))?;
                let len = len.map(|n| n as u64);
                Ok(Schema {
                    items: Some(Box::new(items)),
                    min_items: len,
                    max_items: len,
                    ..Schema::typed(InstanceType::Array)
                })
            }
            Kind::Map { values } => {
                let values = self.schema_for(&values.get(), &format!("{path}{{}}"))?;
                Ok(Schema {
                    pattern_properties: Some(IndexMap::from([(".*".to_string(), values)])),
                    ..Schema::typed(InstanceType::Object)
                })
            }
            Kind::Record(fields) => self.record(desc, fields, path),
            Kind::Unsupported(what) => Err(ReflectError::UnsupportedType {
                path: path.to_string(),
                type_name: desc.type_name,
                reason: format!("{what} types have no schema representation"),
            }),
            _ => Err(ReflectError::UnsupportedType {
                path: path.to_string(),
                type_name: desc.type_name,
                reason: "no schema mapping".to_string(),
            }),
        }
    }

    /// Root record with its keywords at the top of the document.
    pub(crate) fn expanded_root(&mut self, desc: &TypeDesc, path: &str) -> ReflectResult<Schema> {
        let target = desc.clone().pointee();
        if let Some(schema) = self.mapped(&target, path)? {
            return Ok(schema);
        }
        match &target.kind {
            Kind::Record(fields) => {
                self.registry.bind_root(&target);
                self.record_body(fields, path)
            }
            _ => self.schema_for(&target, path),
        }
    }

    fn mapped(&self, desc: &TypeDesc, path: &str) -> ReflectResult<Option<Schema>> {
        match self.config.mapping(desc) {
            Mapping::Default => Ok(None),
            Mapping::Replace(schema) => Ok(Some(schema)),
            Mapping::Reject(reason) => Err(ReflectError::OverrideRejected {
                path: path.to_string(),
                type_name: desc.type_name,
                reason,
            }),
        }
    }

    fn record(&mut self, desc: &TypeDesc, fields: &[FieldDesc], path: &str) -> ReflectResult<Schema> {
        let Some(name) = desc.name else {
            return self.inline_record(desc, fields, path);
        };
        match self.registry.resolve(desc, name)? {
            Resolution::Existing(reference) => Ok(Schema::reference(reference)),
            Resolution::New(reference) => {
                let body = self.record_body(fields, path)?;
                self.registry.define(desc.id, body);
                Ok(Schema::reference(reference))
            }
        }
    }

    fn inline_record(&mut self, desc: &TypeDesc, fields: &[FieldDesc], path: &str) -> ReflectResult<Schema> {
        if self.inlining.contains(&desc.id) {
            return Err(ReflectError::UnsupportedType {
                path: path.to_string(),
                type_name: desc.type_name,
                reason: "anonymous record refers to itself; give it a name".to_string(),
            });
        }
        self.inlining.push(desc.id);
        let body = self.record_body(fields, path);
        self.inlining.pop();
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::Describe;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::mpsc::Sender;

    struct Loop;

    impl Describe for Loop {
        fn describe() -> TypeDesc {
            TypeDesc::anonymous_record::<Self>(vec![FieldDesc::new::<Option<Box<Loop>>>("again")])
        }
    }

    struct Inline;

    impl Describe for Inline {
        fn describe() -> TypeDesc {
            TypeDesc::anonymous_record::<Self>(vec![FieldDesc::new::<u8>("n")])
        }
    }

    fn walk<T: Describe>(config: &ReflectorConfig) -> ReflectResult<Schema> {
        Walker::new(config).schema_for(&T::describe(), "root")
    }

    #[test]
    fn maps_are_open_objects() {
        let schema = walk::<HashMap<String, serde_json::Value>>(&ReflectorConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(schema).unwrap(),
            json!({"type": "object", "patternProperties": {".*": {}}})
        );
    }

    #[test]
    fn fixed_arrays_bound_their_length() {
        let schema = walk::<[i32; 3]>(&ReflectorConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(schema).unwrap(),
            json!({"type": "array", "items": {"type": "integer"}, "minItems": 3, "maxItems": 3})
        );
    }

    #[test]
    fn anonymous_records_inline() {
        let config = ReflectorConfig::default();
        let mut walker = Walker::new(&config);
        let schema = walker.schema_for(&Inline::describe(), "root").unwrap();
        assert_eq!(schema.instance_type, Some(InstanceType::Object));
        assert!(walker.into_definitions().is_empty());
    }

    #[test]
    fn anonymous_cycles_are_reported() {
        let err = walk::<Loop>(&ReflectorConfig::default()).unwrap_err();
        assert!(matches!(err, ReflectError::UnsupportedType { ref path, .. } if path == "root.again"));
    }

    #[test]
    fn channels_are_unsupported() {
        let err = walk::<Vec<Sender<u8>>>(&ReflectorConfig::default()).unwrap_err();
        match err {
            ReflectError::UnsupportedType { path, reason, .. } => {
                assert_eq!(path, "root[]");
                assert!(reason.contains("channel"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mapper_rejection_fails_the_walk() {
        let config = ReflectorConfig {
            type_mapper: Some(crate::resolve::TypeMapper::new(|desc| {
                if desc.is::<f64>() { Mapping::Reject("floats are banned".into()) } else { Mapping::Default }
            })),
            ..ReflectorConfig::default()
        };
        let err = walk::<Option<f64>>(&config).unwrap_err();
        assert!(matches!(err, ReflectError::OverrideRejected { ref reason, .. } if reason == "floats are banned"));
    }
}
