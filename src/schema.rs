//! Output tree: one `Schema` node per value shape, plus the top-level `Document`.
//!
//! Everything here is plain data. Serialization goes through serde; field
//! declaration order is the emitted key order.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

/// Prefix every definition reference is built from.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl InstanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "string" => Self::String,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => return None,
        })
    }
}

impl std::fmt::Display for InstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hyper-schema media hint, used for binary blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub binary_encoding: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<InstanceType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<IndexMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,

    /// Caller-defined extension keywords, emitted verbatim.
    #[serde(flatten)]
    pub extras: IndexMap<String, Value>,
}

impl Schema {
    pub fn typed(t: InstanceType) -> Self {
        Self { instance_type: Some(t), ..Self::default() }
    }

    pub fn formatted(t: InstanceType, format: &str) -> Self {
        Self { instance_type: Some(t), format: Some(format.to_string()), ..Self::default() }
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self { reference: Some(target.into()), ..Self::default() }
    }

    /// The empty schema; accepts any instance.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }
}

/// Top-level output of one reflection call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$schema")]
    pub version: String,

    #[serde(flatten)]
    pub root: Schema,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, Schema>,
}

impl Document {
    pub fn new(root: Schema, definitions: BTreeMap<String, Schema>) -> Self {
        Self { version: DRAFT_04.to_string(), root, definitions }
    }

    pub fn definition(&self, name: &str) -> Option<&Schema> {
        self.definitions.get(name)
    }

    /// Follow a `$ref` produced by this crate back to its definition.
    pub fn resolve_reference(&self, node: &Schema) -> Option<&Schema> {
        let target = node.reference.as_deref()?;
        if target == "#" {
            return Some(&self.root);
        }
        let name = target.strip_prefix(DEFINITIONS_PREFIX)?;
        self.definitions.get(name)
    }
}

/// Prefer emitting integers when exact.
pub fn json_number_pref_i64(n: f64) -> Option<Number> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_fields_are_skipped() {
        let node = Schema::typed(InstanceType::Integer);
        assert_eq!(serde_json::to_value(&node).unwrap(), json!({"type": "integer"}));
        assert_eq!(serde_json::to_value(Schema::any()).unwrap(), json!({}));
    }

    #[test]
    fn extras_flatten_into_the_node() {
        let mut node = Schema::typed(InstanceType::String);
        node.extras.insert("foo".into(), json!("bar"));
        assert_eq!(serde_json::to_value(&node).unwrap(), json!({"type": "string", "foo": "bar"}));
    }

    #[test]
    fn document_puts_root_keywords_at_top_level() {
        let mut definitions = BTreeMap::new();
        definitions.insert("Leaf".to_string(), Schema::typed(InstanceType::Object));
        let doc = Document::new(Schema::reference("#/definitions/Leaf"), definitions);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["$schema"], DRAFT_04);
        assert_eq!(value["$ref"], "#/definitions/Leaf");
        assert_eq!(value["definitions"]["Leaf"]["type"], "object");

        let leaf = doc.resolve_reference(&doc.root).unwrap();
        assert_eq!(leaf.instance_type, Some(InstanceType::Object));
    }

    #[test]
    fn integral_numbers_stay_integers() {
        assert_eq!(json_number_pref_i64(18.0), Some(Number::from(18)));
        assert_eq!(json_number_pref_i64(1.5).unwrap().as_f64(), Some(1.5));
        assert_eq!(json_number_pref_i64(f64::NAN), None);
    }

    #[test]
    fn values_outside_i64_stay_floats() {
        let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        let n = json_number_pref_i64(two_pow_63).unwrap();
        assert!(!n.is_i64());
        assert_eq!(n.as_f64(), Some(two_pow_63));
        assert_eq!(json_number_pref_i64(i64::MIN as f64), Some(Number::from(i64::MIN)));
    }
}
