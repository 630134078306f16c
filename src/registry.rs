//! Named definitions for one reflection call.
//!
//! A named record is reserved before its fields are walked, so a second
//! encounter (including one from inside its own fields) resolves to the
//! existing `$ref` and the walk stops there.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use crate::describe::TypeDesc;
use crate::error::{ReflectError, ReflectResult};
use crate::schema::{DEFINITIONS_PREFIX, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// First sighting; the caller must walk the type and `define` it.
    New(String),
    /// Already reserved; use the reference and do not recurse.
    Existing(String),
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    reference: String,
    type_name: &'static str,
}

#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    entries: HashMap<TypeId, Entry>,
    owners: HashMap<String, TypeId>,
    definitions: BTreeMap<String, Schema>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `desc` to the document root (`#`) without creating a definition.
    /// Used when the root record is expanded inline.
    pub fn bind_root(&mut self, desc: &TypeDesc) {
        let name = desc.display_name().to_string();
        self.owners.insert(name.clone(), desc.id);
        self.entries.insert(desc.id, Entry {
            name,
            reference: "#".to_string(),
            type_name: desc.type_name,
        });
    }

    /// Reserve a definition for a named type, or return the existing reference.
    /// Anonymous types must be inlined by the caller and never reach here.
    pub fn resolve(&mut self, desc: &TypeDesc, name: &str) -> ReflectResult<Resolution> {
        if let Some(entry) = self.entries.get(&desc.id) {
            return Ok(Resolution::Existing(entry.reference.clone()));
        }
        if let Some(owner) = self.owners.get(name) {
            let first = self.entries.get(owner).map_or("<unknown>", |e| e.type_name);
            return Err(ReflectError::NameCollision {
                name: name.to_string(),
                first,
                second: desc.type_name,
            });
        }
        let reference = format!("{DEFINITIONS_PREFIX}{name}");
        tracing::trace!(definition = name, type_name = desc.type_name, "reserved definition");
        self.owners.insert(name.to_string(), desc.id);
        self.entries.insert(desc.id, Entry {
            name: name.to_string(),
            reference: reference.clone(),
            type_name: desc.type_name,
        });
        Ok(Resolution::New(reference))
    }

    /// Fill a reserved definition.
    pub fn define(&mut self, id: TypeId, schema: Schema) {
        if let Some(entry) = self.entries.get(&id) {
            self.definitions.insert(entry.name.clone(), schema);
        }
    }

    pub fn is_reserved(&self, id: TypeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn into_definitions(self) -> BTreeMap<String, Schema> {
        self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{Describe, Kind};
    use crate::schema::InstanceType;

    struct Alpha;
    struct Beta;

    fn named<T: 'static>(name: &'static str) -> TypeDesc {
        TypeDesc::new::<T>(Kind::Record(Vec::new())).named(name)
    }

    #[test]
    fn reserve_then_reuse() {
        let mut reg = DefinitionRegistry::new();
        let alpha = named::<Alpha>("Alpha");
        assert_eq!(reg.resolve(&alpha, "Alpha").unwrap(), Resolution::New("#/definitions/Alpha".into()));
        assert_eq!(reg.resolve(&alpha, "Alpha").unwrap(), Resolution::Existing("#/definitions/Alpha".into()));
        assert!(reg.is_reserved(alpha.id));
        assert!(reg.is_empty());

        reg.define(alpha.id, Schema::typed(InstanceType::Object));
        assert_eq!(reg.len(), 1);
        assert!(reg.into_definitions().contains_key("Alpha"));
    }

    #[test]
    fn same_name_different_type_collides() {
        let mut reg = DefinitionRegistry::new();
        reg.resolve(&named::<Alpha>("Thing"), "Thing").unwrap();
        let err = reg.resolve(&named::<Beta>("Thing"), "Thing").unwrap_err();
        assert!(matches!(err, ReflectError::NameCollision { ref name, .. } if name == "Thing"));
    }

    #[test]
    fn root_binding_refers_to_document() {
        let mut reg = DefinitionRegistry::new();
        let alpha = named::<Alpha>("Alpha");
        reg.bind_root(&alpha);
        assert_eq!(reg.resolve(&alpha, "Alpha").unwrap(), Resolution::Existing("#".into()));
        assert!(reg.is_empty());
    }

    #[test]
    fn definitions_come_out_sorted() {
        let mut reg = DefinitionRegistry::new();
        for desc in [named::<Beta>("Beta"), named::<Alpha>("Alpha"), i64::describe().named("Zeta")] {
            let name = desc.name.unwrap();
            reg.resolve(&desc, name).unwrap();
            reg.define(desc.id, Schema::any());
        }
        let names: Vec<_> = reg.into_definitions().into_keys().collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Zeta"]);
    }
}
