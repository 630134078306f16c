//! Flattening pass: a record's declared fields, with embedded members
//! expanded in place, reduced to the fields that will be emitted.
//!
//! Rules:
//! - skipped, annotation-ignored and ignored-type fields are dropped, and so
//!   are private fields unless they are embedded;
//! - an embedded member without a wire name promotes the public fields of its
//!   record (through `Option`/`Box` too), whatever its own visibility;
//!   embedded non-records contribute nothing;
//! - an embedded member the type mapper replaces is not promoted: it stays a
//!   single field named by its identifier (dropped if private);
//! - on a name clash the shallower field wins, at the position of the name's
//!   first appearance. Between equally deep fields the first declared wins.

use std::any::TypeId;

use indexmap::IndexMap;

use crate::annotation;
use crate::describe::{FieldDesc, Kind, TypeDesc};
use crate::error::{ReflectError, ReflectResult};
use crate::reflect::ReflectorConfig;
use crate::resolve::Mapping;

struct Slot {
    depth: usize,
    field: FieldDesc,
}

pub(crate) fn flatten(fields: &[FieldDesc], config: &ReflectorConfig, path: &str) -> ReflectResult<Vec<FieldDesc>> {
    let mut slots: IndexMap<&'static str, Slot> = IndexMap::new();
    collect(fields, 0, config, path, &mut slots, &mut Vec::new())?;
    Ok(slots.into_values().map(|slot| slot.field).collect())
}

fn collect(
    fields: &[FieldDesc],
    depth: usize,
    config: &ReflectorConfig,
    path: &str,
    slots: &mut IndexMap<&'static str, Slot>,
    embedding: &mut Vec<TypeId>,
) -> ReflectResult<()> {
    for field in fields {
        if field.skip || annotation::is_ignored(field.annotation) {
            continue;
        }
        let ty = field.ty.get();
        if config.ignores(&ty) {
            continue;
        }

        if field.embedded
            && field.rename.is_none()
            && !is_overridden(&ty, config, &format!("{path}.{}", field.ident))?
        {
            let target = ty.pointee();
            if let Kind::Record(inner) = &target.kind {
                // a record embedding itself would never bottom out
                if !embedding.contains(&target.id) {
                    embedding.push(target.id);
                    collect(inner, depth + 1, config, path, slots, embedding)?;
                    embedding.pop();
                }
            }
            continue;
        }
        if !field.public {
            continue;
        }

        let name = field.output_name();
        match slots.get_mut(name) {
            Some(slot) if slot.depth > depth => {
                slot.depth = depth;
                slot.field = field.clone();
            }
            Some(_) => {}
            None => {
                slots.insert(name, Slot { depth, field: field.clone() });
            }
        }
    }
    Ok(())
}

/// True when the mapper replaces `desc` or a type it wraps.
fn is_overridden(desc: &TypeDesc, config: &ReflectorConfig, path: &str) -> ReflectResult<bool> {
    match config.mapping(desc) {
        Mapping::Replace(_) => return Ok(true),
        Mapping::Reject(reason) => {
            return Err(ReflectError::OverrideRejected {
                path: path.to_string(),
                type_name: desc.type_name,
                reason,
            });
        }
        Mapping::Default => {}
    }
    match &desc.kind {
        Kind::Optional(inner) | Kind::Pointer(inner) => is_overridden(&inner.get(), config, path),
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::{Describe, TypeDesc};
    use std::collections::HashMap;

    struct Grandparent;
    struct Base;
    struct Hidden;

    impl Describe for Grandparent {
        fn describe() -> TypeDesc {
            TypeDesc::record::<Self>("Grandparent", vec![
                FieldDesc::new::<String>("FamilyName").rename("family_name"),
                FieldDesc::new::<i32>("Shared").rename("shared"),
            ])
        }
    }

    impl Describe for Base {
        fn describe() -> TypeDesc {
            TypeDesc::record::<Self>("Base", vec![
                FieldDesc::embed::<Option<Box<Grandparent>>>("Grandparent"),
                FieldDesc::new::<i32>("Level").rename("level"),
                FieldDesc::new::<i32>("Secret").private().tag("required"),
                FieldDesc::new::<i32>("Skipped").skip().tag("required"),
                FieldDesc::new::<i32>("Untagged").tag("-,required"),
            ])
        }
    }

    impl Describe for Hidden {
        fn describe() -> TypeDesc {
            TypeDesc::record::<Self>("Hidden", vec![
                FieldDesc::new::<i32>("Public"),
                FieldDesc::new::<i32>("Private").private(),
            ])
        }
    }

    fn names(fields: &[FieldDesc]) -> Vec<&'static str> {
        fields.iter().map(FieldDesc::output_name).collect()
    }

    #[test]
    fn embedded_fields_promote_and_explicit_fields_override() {
        let fields = vec![
            FieldDesc::embed::<Base>("Base"),
            FieldDesc::embed::<Hidden>("Hidden").private(),
            FieldDesc::embed::<HashMap<String, i32>>("Extra"),
            FieldDesc::new::<String>("Shared").rename("shared"),
            FieldDesc::new::<i64>("ID").rename("id"),
        ];
        let flat = flatten(&fields, &ReflectorConfig::default(), "Root").unwrap();
        // the private embedded `Hidden` still promotes its public field
        assert_eq!(names(&flat), vec!["family_name", "shared", "level", "Public", "id"]);
        // the top-level declaration replaced the inherited one in place
        assert!(flat[1].ty.get().is::<String>());
    }

    #[test]
    fn renamed_embedded_member_is_a_plain_field() {
        let fields = vec![FieldDesc::embed::<Base>("Base").rename("base")];
        let flat = flatten(&fields, &ReflectorConfig::default(), "Root").unwrap();
        assert_eq!(names(&flat), vec!["base"]);
    }

    #[test]
    fn ignored_types_are_not_promoted() {
        let mut config = ReflectorConfig::default();
        config.ignored_types.insert(TypeId::of::<Grandparent>());
        let flat = flatten(&[FieldDesc::embed::<Base>("Base")], &config, "Root").unwrap();
        assert_eq!(names(&flat), vec!["level"]);
    }

    fn stamp_mapper(mapping: fn() -> Mapping) -> ReflectorConfig {
        ReflectorConfig {
            type_mapper: Some(crate::resolve::TypeMapper::new(move |desc: &TypeDesc| {
                if desc.is::<Grandparent>() { mapping() } else { Mapping::Default }
            })),
            ..ReflectorConfig::default()
        }
    }

    #[test]
    fn mapped_embedded_member_stays_whole() {
        let config = stamp_mapper(|| Mapping::Replace(crate::schema::Schema::any()));
        let fields = vec![
            FieldDesc::embed::<Option<Box<Grandparent>>>("Grandparent"),
            FieldDesc::new::<String>("Kind").rename("kind"),
        ];
        let flat = flatten(&fields, &config, "Root").unwrap();
        assert_eq!(names(&flat), vec!["Grandparent", "kind"]);

        // nested inside a promoted record, too
        let flat = flatten(&[FieldDesc::embed::<Base>("Base")], &config, "Root").unwrap();
        assert_eq!(names(&flat), vec!["Grandparent", "level"]);

        let private = vec![FieldDesc::embed::<Grandparent>("Grandparent").private()];
        assert!(flatten(&private, &config, "Root").unwrap().is_empty());
    }

    #[test]
    fn rejected_embedded_member_fails() {
        let config = stamp_mapper(|| Mapping::Reject("no stamps".into()));
        let err = flatten(&[FieldDesc::embed::<Grandparent>("Grandparent")], &config, "Root").unwrap_err();
        assert!(matches!(
            err,
            ReflectError::OverrideRejected { ref path, ref reason, .. } if path == "Root.Grandparent" && reason == "no stamps"
        ));
    }
}
