//! Schema assembly: merges a field's structural schema with its annotations
//! and builds a record's `properties`, `required` and `oneOf` groups.

use indexmap::IndexMap;
use serde_json::Value;

use crate::annotation::{self, AnnotationError, Annotations};
use crate::describe::{FieldDesc, Kind, TypeDesc};
use crate::error::{ReflectError, ReflectResult};
use crate::reflect::ReflectorConfig;
use crate::reflect::fields;
use crate::reflect::walk::Walker;
use crate::schema::{InstanceType, Schema, json_number_pref_i64};

impl Walker<'_> {
    /// Object node for a record's fields. The caller decides whether it is
    /// inlined or stored as a definition.
    pub(crate) fn record_body(&mut self, declared: &[FieldDesc], path: &str) -> ReflectResult<Schema> {
        let flat = fields::flatten(declared, self.config, path)?;

        let mut properties = IndexMap::with_capacity(flat.len());
        let mut required = Vec::new();
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();

        for field in &flat {
            let name = field.output_name();
            let field_path = format!("{path}.{name}");
            let malformed = |source| ReflectError::MalformedAnnotation {
                path: field_path.clone(),
                source,
            };

            let annotations = annotation::parse(field.annotation, field.description, field.extras)
                .map_err(malformed)?;
            let ty = field.ty.get();
            let structural = self.schema_for(&ty, &field_path)?;
            let node = apply_annotations(structural, &ty, &annotations).map_err(malformed)?;

            if let Some(group) = &annotations.one_of_group {
                groups.entry(group.clone()).or_default().push(name.to_string());
            } else if is_required(field, &ty, &annotations, self.config) {
                required.push(name.to_string());
            }
            properties.insert(name.to_string(), node);
        }

        let one_of = groups
            .into_iter()
            .map(|(group, members)| Schema {
                title: Some(group),
                required: members,
                ..Schema::default()
            })
            .collect();

        Ok(Schema {
            properties: Some(properties),
            required,
            additional_properties: Some(self.config.allow_additional_properties),
            one_of,
            ..Schema::typed(InstanceType::Object)
        })
    }
}

/// A field is required when it asks to be, or (outside annotation-only mode)
/// when it is always serialized and not optional. Group members never are:
/// their requirement lives in the parent's `oneOf`.
fn is_required(field: &FieldDesc, ty: &TypeDesc, annotations: &Annotations, config: &ReflectorConfig) -> bool {
    if annotations.one_of_group.is_some() {
        return false;
    }
    if let Some(explicit) = annotations.required {
        return explicit;
    }
    if config.required_from_annotation_only {
        return false;
    }
    !field.omit_empty && !is_optional(ty)
}

fn is_optional(ty: &TypeDesc) -> bool {
    match &ty.kind {
        Kind::Optional(_) => true,
        Kind::Pointer(inner) => is_optional(&inner.get()),
        _ => false,
    }
}

fn not_applicable(keyword: &'static str, target: Option<InstanceType>) -> AnnotationError {
    let target = match target {
        Some(t) => format!("{t} fields"),
        None => "untyped fields".to_string(),
    };
    AnnotationError::NotApplicable { keyword, target }
}

fn check(keywords: &[(&'static str, bool)], allowed: bool, target: Option<InstanceType>) -> Result<(), AnnotationError> {
    match keywords.iter().find(|(_, set)| *set) {
        Some((keyword, _)) if !allowed => Err(not_applicable(*keyword, target)),
        _ => Ok(()),
    }
}

/// Merge parsed annotations into a field's structural schema.
pub(crate) fn apply_annotations(mut node: Schema, ty: &TypeDesc, a: &Annotations) -> Result<Schema, AnnotationError> {
    if !a.one_of_types.is_empty() {
        if !matches!(ty.clone().pointee().kind, Kind::Any) {
            return Err(AnnotationError::OneOfTypeOnTypedField);
        }
        node = Schema {
            one_of: a.one_of_types.iter().map(|t| Schema::typed(*t)).collect(),
            ..Schema::default()
        };
    }

    let target = node.instance_type;
    let numeric = matches!(target, Some(InstanceType::Integer | InstanceType::Number));
    check(&a.string_keywords(), target == Some(InstanceType::String), target)?;
    check(&a.numeric_keywords(), numeric, target)?;
    check(&a.array_keywords(), target == Some(InstanceType::Array), target)?;

    if a.title.is_some() {
        node.title = a.title.clone();
    }
    if a.description.is_some() {
        node.description = a.description.clone();
    }

    if let Some(format) = &a.format {
        match (target, node.items.as_deref_mut()) {
            (Some(InstanceType::String), _) => node.format = Some(format.clone()),
            (Some(InstanceType::Array), Some(items)) => items.format = Some(format.clone()),
            _ => return Err(not_applicable("format", target)),
        }
    }

    node.min_length = a.min_length.or(node.min_length);
    node.max_length = a.max_length.or(node.max_length);
    if a.pattern.is_some() {
        node.pattern = a.pattern.clone();
    }

    if let Some(n) = a.minimum {
        node.minimum = json_number_pref_i64(n);
    }
    if let Some(n) = a.maximum {
        node.maximum = json_number_pref_i64(n);
    }
    if let Some(n) = a.multiple_of {
        node.multiple_of = json_number_pref_i64(n);
    }
    node.exclusive_minimum = a.exclusive_minimum.or(node.exclusive_minimum);
    node.exclusive_maximum = a.exclusive_maximum.or(node.exclusive_maximum);

    node.min_items = a.min_items.or(node.min_items);
    node.max_items = a.max_items.or(node.max_items);
    if a.unique_items {
        node.unique_items = Some(true);
    }

    // an enumeration's symbolic names are the whole value set
    if !a.enum_values.is_empty() && !node.enum_values.is_empty() {
        return Err(AnnotationError::NotApplicable {
            keyword: "enum",
            target: "fields with a fixed value set".to_string(),
        });
    }
    for raw in &a.enum_values {
        node.enum_values.push(typed_value("enum", raw, target)?);
    }
    for raw in &a.examples {
        node.examples.push(typed_value("example", raw, target)?);
    }
    if let Some(raw) = &a.default {
        node.default = Some(typed_value("default", raw, target)?);
    }

    node.extras.extend(a.extras.iter().map(|(k, v)| (k.clone(), v.clone())));

    if a.nullable {
        node = Schema {
            one_of: vec![node, Schema::typed(InstanceType::Null)],
            ..Schema::default()
        };
    }
    Ok(node)
}

/// Give a raw annotation value the JSON type of the node it lands on.
fn typed_value(keyword: &'static str, raw: &str, target: Option<InstanceType>) -> Result<Value, AnnotationError> {
    let invalid = |expected| AnnotationError::InvalidValue {
        key: keyword.to_string(),
        value: raw.to_string(),
        expected,
    };
    match target {
        Some(InstanceType::String) => Ok(Value::from(raw)),
        Some(InstanceType::Integer) => {
            let raw = raw.trim();
            raw.parse::<i64>()
                .map(Value::from)
                .or_else(|_| raw.parse::<u64>().map(Value::from))
                .map_err(|_| invalid("an integer"))
        }
        Some(InstanceType::Number) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(json_number_pref_i64)
            .map(Value::Number)
            .ok_or_else(|| invalid("a number")),
        Some(InstanceType::Boolean) => raw.trim().parse::<bool>().map(Value::from).map_err(|_| invalid("`true` or `false`")),
        _ => Err(not_applicable(keyword, target)),
    }
}
