//! Field annotation parsing.
//!
//! An annotation is a comma-separated list of `key=value` tokens and bare
//! flags, e.g. `required,minLength=1,enum=red,enum=green`. Parsing is strict:
//! unknown keys and unparseable values are errors, so a typo in a constraint
//! never silently disappears from the schema. Extension keywords live in a
//! separate extras string and pass through untouched.
//!
//! Values are kept as written for `enum`, `example` and `default`; they only
//! get a JSON type once the field's schema type is known (see
//! `reflect::build`).

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::schema::InstanceType;

/// Marker that drops a field entirely.
pub const IGNORE_MARKER: &str = "-";

static EXTRA_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$\-]*$").expect("extras key regex is valid")
});

/// Keywords the schema tree emits itself; extras may not shadow them.
const RESERVED_KEYWORDS: &[&str] = &[
    "$ref", "$schema", "type", "title", "description", "properties",
    "patternProperties", "required", "additionalProperties", "items",
    "minItems", "maxItems", "uniqueItems", "minLength", "maxLength",
    "pattern", "format", "multipleOf", "minimum", "exclusiveMinimum",
    "maximum", "exclusiveMaximum", "enum", "default", "examples", "oneOf",
    "media", "definitions",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationError {
    #[error("unknown annotation key `{0}`")]
    UnknownKey(String),

    #[error("unknown annotation flag `{0}`")]
    UnknownFlag(String),

    #[error("`{key}` expects {expected}, got `{value}`")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("`pattern` is not a valid regular expression: {0}")]
    InvalidPattern(String),

    #[error("`oneof_type` names unknown type `{0}`")]
    UnknownInstanceType(String),

    #[error("`{keyword}` does not apply to {target}")]
    NotApplicable { keyword: &'static str, target: String },

    #[error("`oneof_type` is only allowed on open-typed fields")]
    OneOfTypeOnTypedField,

    #[error("malformed extras token `{0}`, expected key=value")]
    MalformedExtra(String),

    #[error("extras key `{0}` is reserved or not an identifier")]
    InvalidExtraKey(String),
}

/// Parsed view of one field's annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    /// `Some(true)` for `required`, `Some(false)` for `required=false`.
    pub required: Option<bool>,
    pub nullable: bool,

    pub title: Option<String>,
    pub description: Option<String>,

    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<bool>,
    pub exclusive_maximum: Option<bool>,
    pub multiple_of: Option<f64>,

    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,

    pub enum_values: Vec<String>,
    pub examples: Vec<String>,
    pub default: Option<String>,

    pub one_of_group: Option<String>,
    pub one_of_types: Vec<InstanceType>,

    pub extras: IndexMap<String, Value>,
}

impl Annotations {
    /// Keywords that only make sense on string nodes, with whether each is set.
    pub(crate) fn string_keywords(&self) -> [(&'static str, bool); 3] {
        [
            ("minLength", self.min_length.is_some()),
            ("maxLength", self.max_length.is_some()),
            ("pattern", self.pattern.is_some()),
        ]
    }

    pub(crate) fn numeric_keywords(&self) -> [(&'static str, bool); 5] {
        [
            ("minimum", self.minimum.is_some()),
            ("maximum", self.maximum.is_some()),
            ("exclusiveMinimum", self.exclusive_minimum.is_some()),
            ("exclusiveMaximum", self.exclusive_maximum.is_some()),
            ("multipleOf", self.multiple_of.is_some()),
        ]
    }

    pub(crate) fn array_keywords(&self) -> [(&'static str, bool); 3] {
        [
            ("minItems", self.min_items.is_some()),
            ("maxItems", self.max_items.is_some()),
            ("uniqueItems", self.unique_items),
        ]
    }
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// True when the annotation carries the ignore marker. Checked before
/// parsing, so an ignored field never fails reflection.
pub fn is_ignored(annotation: Option<&str>) -> bool {
    annotation.is_some_and(|a| tokens(a).any(|t| t == IGNORE_MARKER))
}

/// Parse a field's annotation, its secondary description and its extras.
pub fn parse(
    annotation: Option<&str>,
    description: Option<&str>,
    extras: Option<&str>,
) -> Result<Annotations, AnnotationError> {
    let mut out = Annotations {
        description: description.map(str::to_string),
        ..Annotations::default()
    };

    for token in annotation.map(tokens).into_iter().flatten() {
        match token.split_once('=') {
            None => apply_flag(&mut out, token)?,
            Some((key, value)) => apply_pair(&mut out, key.trim(), value)?,
        }
    }

    if let Some(extras) = extras {
        out.extras = parse_extras(extras)?;
    }
    Ok(out)
}

fn apply_flag(out: &mut Annotations, flag: &str) -> Result<(), AnnotationError> {
    match flag {
        "required" => out.required = Some(true),
        "nullable" => out.nullable = true,
        "uniqueItems" => out.unique_items = true,
        IGNORE_MARKER => {}
        other => return Err(AnnotationError::UnknownFlag(other.to_string())),
    }
    Ok(())
}

fn apply_pair(out: &mut Annotations, key: &str, value: &str) -> Result<(), AnnotationError> {
    match key {
        "title" => out.title = Some(value.to_string()),
        "description" => out.description = Some(value.to_string()),
        "format" => out.format = Some(value.to_string()),
        "pattern" => {
            Regex::new(value).map_err(|e| AnnotationError::InvalidPattern(e.to_string()))?;
            out.pattern = Some(value.to_string());
        }
        "minLength" => out.min_length = Some(parse_u64(key, value)?),
        "maxLength" => out.max_length = Some(parse_u64(key, value)?),
        "minItems" => out.min_items = Some(parse_u64(key, value)?),
        "maxItems" => out.max_items = Some(parse_u64(key, value)?),
        "minimum" => out.minimum = Some(parse_f64(key, value)?),
        "maximum" => out.maximum = Some(parse_f64(key, value)?),
        "multipleOf" => out.multiple_of = Some(parse_f64(key, value)?),
        "exclusiveMinimum" => out.exclusive_minimum = Some(parse_bool(key, value)?),
        "exclusiveMaximum" => out.exclusive_maximum = Some(parse_bool(key, value)?),
        "uniqueItems" => out.unique_items = parse_bool(key, value)?,
        "required" => out.required = Some(parse_bool(key, value)?),
        "enum" => out.enum_values.push(value.to_string()),
        "example" => out.examples.push(value.to_string()),
        "default" => out.default = Some(value.to_string()),
        "oneof_required" => {
            if value.is_empty() {
                return Err(invalid(key, value, "a group name"));
            }
            out.one_of_group = Some(value.to_string());
        }
        "oneof_type" => {
            for name in value.split(';').map(str::trim) {
                let ty = InstanceType::parse(name)
                    .ok_or_else(|| AnnotationError::UnknownInstanceType(name.to_string()))?;
                out.one_of_types.push(ty);
            }
        }
        other => return Err(AnnotationError::UnknownKey(other.to_string())),
    }
    Ok(())
}

fn parse_extras(extras: &str) -> Result<IndexMap<String, Value>, AnnotationError> {
    let mut out: IndexMap<String, Value> = IndexMap::new();
    for token in tokens(extras) {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| AnnotationError::MalformedExtra(token.to_string()))?;
        let key = key.trim();
        if !EXTRA_KEY.is_match(key) || RESERVED_KEYWORDS.contains(&key) {
            return Err(AnnotationError::InvalidExtraKey(key.to_string()));
        }
        let value = Value::from(value);
        match out.get_mut(key) {
            None => {
                out.insert(key.to_string(), value);
            }
            // repeated key: collect into an array
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    Ok(out)
}

fn invalid(key: &str, value: &str, expected: &'static str) -> AnnotationError {
    AnnotationError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, AnnotationError> {
    value.trim().parse().map_err(|_| invalid(key, value, "a non-negative integer"))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, AnnotationError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| invalid(key, value, "a number"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AnnotationError> {
    value.trim().parse().map_err(|_| invalid(key, value, "`true` or `false`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tag(s: &str) -> Annotations {
        parse(Some(s), None, None).unwrap()
    }

    #[test]
    fn flags_and_scalars() {
        let a = tag("required,minLength=1,maxLength=20,pattern=.*,description=this is a property,title=the name");
        assert_eq!(a.required, Some(true));
        assert_eq!(a.min_length, Some(1));
        assert_eq!(a.max_length, Some(20));
        assert_eq!(a.pattern.as_deref(), Some(".*"));
        assert_eq!(a.description.as_deref(), Some("this is a property"));
        assert_eq!(a.title.as_deref(), Some("the name"));
    }

    #[test]
    fn repeated_enum_and_example_accumulate_in_order() {
        let a = tag("enum=red,enum=green,enum=red,example=joe,example=lucy,example=joe");
        assert_eq!(a.enum_values, vec!["red", "green", "red"]);
        assert_eq!(a.examples, vec!["joe", "lucy", "joe"]);
    }

    #[test]
    fn numeric_keys_reject_garbage() {
        let err = parse(Some("minLength=abc"), None, None).unwrap_err();
        assert_eq!(err, AnnotationError::InvalidValue {
            key: "minLength".into(),
            value: "abc".into(),
            expected: "a non-negative integer",
        });
        assert!(parse(Some("minimum=ten"), None, None).is_err());
        assert!(parse(Some("exclusiveMaximum=yes"), None, None).is_err());
    }

    #[test]
    fn unknown_keys_and_flags_fail_fast() {
        assert_eq!(
            parse(Some("minLenght=3"), None, None).unwrap_err(),
            AnnotationError::UnknownKey("minLenght".into())
        );
        assert_eq!(
            parse(Some("requried"), None, None).unwrap_err(),
            AnnotationError::UnknownFlag("requried".into())
        );
    }

    #[test]
    fn ignore_marker_is_found_before_parsing() {
        assert!(is_ignored(Some("-,required")));
        assert!(is_ignored(Some("required, -")));
        assert!(!is_ignored(Some("required")));
        assert!(!is_ignored(None));
    }

    #[test]
    fn oneof_directives() {
        let a = tag("oneof_required=group2,oneof_type=string;array");
        assert_eq!(a.one_of_group.as_deref(), Some("group2"));
        assert_eq!(a.one_of_types, vec![InstanceType::String, InstanceType::Array]);
        assert_eq!(
            parse(Some("oneof_type=string;on"), None, None).unwrap_err(),
            AnnotationError::UnknownInstanceType("on".into())
        );
    }

    #[test]
    fn explicit_not_required() {
        assert_eq!(tag("required=false").required, Some(false));
        assert_eq!(tag("").required, None);
    }

    #[test]
    fn annotation_description_beats_secondary_text() {
        let a = parse(Some("description=from tag"), Some("from field"), None).unwrap();
        assert_eq!(a.description.as_deref(), Some("from tag"));
        let b = parse(None, Some("from field"), None).unwrap();
        assert_eq!(b.description.as_deref(), Some("from field"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(matches!(
            parse(Some("pattern=(unclosed"), None, None),
            Err(AnnotationError::InvalidPattern(_))
        ));
    }

    #[test]
    fn extras_pass_through_verbatim() {
        let a = parse(None, None, Some("foo=bar,hello=world,foo=baz")).unwrap();
        assert_eq!(a.extras["foo"], json!(["bar", "baz"]));
        assert_eq!(a.extras["hello"], json!("world"));

        assert!(matches!(
            parse(None, None, Some("lonely")),
            Err(AnnotationError::MalformedExtra(_))
        ));
        assert_eq!(
            parse(None, None, Some("type=int")).unwrap_err(),
            AnnotationError::InvalidExtraKey("type".into())
        );
    }
}
