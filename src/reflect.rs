//! Reflection entry point.
//!
//! A `Reflector` holds immutable configuration. Each call to `reflect` builds
//! a fresh definition registry and schema tree, so one reflector can be shared
//! across threads and reused indefinitely.
mod build;
mod fields;
mod walk;

use std::any::TypeId;
use std::collections::HashSet;

use crate::describe::{Describe, Kind, TypeDesc};
use crate::error::{ReflectError, ReflectResult};
use crate::resolve::{Mapping, TypeMapper};
use crate::schema::Document;

use walk::Walker;

#[derive(Debug, Clone, Default)]
pub struct ReflectorConfig {
    /// Only an explicit `required` annotation makes a field required.
    /// Otherwise fields that are always serialized and not optional are too.
    pub required_from_annotation_only: bool,
    /// Emit `additionalProperties: true` on records instead of `false`.
    pub allow_additional_properties: bool,
    /// Place the root record's keywords at the top of the document instead of
    /// behind a `$ref`.
    pub expand_root_inline: bool,
    /// Types dropped from both properties and definitions.
    pub ignored_types: HashSet<TypeId>,
    pub type_mapper: Option<TypeMapper>,
}

impl ReflectorConfig {
    /// True when `desc`, or anything it wraps, is on the ignore list.
    pub fn ignores(&self, desc: &TypeDesc) -> bool {
        if self.ignored_types.is_empty() {
            return false;
        }
        if self.ignored_types.contains(&desc.id) {
            return true;
        }
        match &desc.kind {
            Kind::Optional(inner) | Kind::Pointer(inner) => self.ignores(&inner.get()),
            Kind::Array { items, .. } => self.ignores(&items.get()),
            Kind::Map { values } => self.ignores(&values.get()),
            _ => false,
        }
    }

    /// The mapper's verdict for `desc`; `Default` when no mapper is set.
    pub(crate) fn mapping(&self, desc: &TypeDesc) -> Mapping {
        match &self.type_mapper {
            Some(mapper) => mapper.map(desc),
            None => Mapping::Default,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reflector {
    config: ReflectorConfig,
}

impl Reflector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReflectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReflectorConfig {
        &self.config
    }

    pub fn required_from_annotation_only(mut self, on: bool) -> Self {
        self.config.required_from_annotation_only = on;
        self
    }

    pub fn allow_additional_properties(mut self, on: bool) -> Self {
        self.config.allow_additional_properties = on;
        self
    }

    pub fn expand_root_inline(mut self, on: bool) -> Self {
        self.config.expand_root_inline = on;
        self
    }

    pub fn ignore<T: 'static>(mut self) -> Self {
        self.config.ignored_types.insert(TypeId::of::<T>());
        self
    }

    pub fn type_mapper(mut self, f: impl Fn(&TypeDesc) -> Mapping + Send + Sync + 'static) -> Self {
        self.config.type_mapper = Some(TypeMapper::new(f));
        self
    }

    pub fn reflect<T: Describe>(&self) -> ReflectResult<Document> {
        self.reflect_desc(&T::describe())
    }

    /// Same as `reflect`, with the type taken from a value.
    pub fn reflect_value<T: Describe>(&self, _value: &T) -> ReflectResult<Document> {
        self.reflect::<T>()
    }

    pub fn reflect_desc(&self, desc: &TypeDesc) -> ReflectResult<Document> {
        let path = desc.display_name().to_string();
        tracing::debug!(root = %path, expanded = self.config.expand_root_inline, "reflecting");

        if self.config.ignores(desc) {
            return Err(ReflectError::UnsupportedType {
                path,
                type_name: desc.type_name,
                reason: "the root type is on the ignore list".to_string(),
            });
        }

        let mut walker = Walker::new(&self.config);
        let root = if self.config.expand_root_inline {
            walker.expanded_root(desc, &path)?
        } else {
            walker.schema_for(desc, &path)?
        };
        let definitions = walker.into_definitions();
        tracing::debug!(root = %path, definitions = definitions.len(), "reflected");
        Ok(Document::new(root, definitions))
    }
}
