//! Type descriptors: the structural view of a Rust type that reflection walks.
//!
//! There is no runtime reflection in Rust, so every reflectable type supplies
//! a `TypeDesc` through the `Describe` trait. Record fields and collection
//! elements hold a `TypeRef` (a plain function pointer) instead of an eagerly
//! built descriptor, which lets a type mention itself without the descriptor
//! itself becoming infinite.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

/// Lazily resolved descriptor.
#[derive(Clone, Copy)]
pub struct TypeRef(fn() -> TypeDesc);

impl TypeRef {
    pub fn of<T: Describe>() -> Self {
        Self(T::describe)
    }

    pub fn get(&self) -> TypeDesc {
        (self.0)()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeRef(..)")
    }
}

#[derive(Debug, Clone)]
pub enum Kind {
    Bool,
    Integer,
    Float,
    String,
    Bytes,
    Timestamp,
    Uri,
    IpAddr,
    /// Integer-backed enumeration rendered by its symbolic names.
    Enumeration(Vec<&'static str>),
    /// Open value: anything goes.
    Any,
    Array { items: TypeRef, len: Option<usize> },
    /// String-keyed map.
    Map { values: TypeRef },
    /// Nullable reference; never auto-required.
    Optional(TypeRef),
    /// Transparent owner (`Box`, `Rc`, `Arc`).
    Pointer(TypeRef),
    Record(Vec<FieldDesc>),
    /// Shape with no schema rendition (functions, channels, ...).
    Unsupported(&'static str),
}

#[derive(Debug, Clone)]
pub struct TypeDesc {
    pub id: TypeId,
    /// Declared name; named records become definitions.
    pub name: Option<&'static str>,
    pub type_name: &'static str,
    pub kind: Kind,
}

impl TypeDesc {
    pub fn new<T: 'static + ?Sized>(kind: Kind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: None,
            type_name: std::any::type_name::<T>(),
            kind,
        }
    }

    /// A named record. Reflection registers it once and refers to it by `$ref`.
    pub fn record<T: 'static>(name: &'static str, fields: Vec<FieldDesc>) -> Self {
        Self::new::<T>(Kind::Record(fields)).named(name)
    }

    /// A record without a declared name; always inlined.
    pub fn anonymous_record<T: 'static>(fields: Vec<FieldDesc>) -> Self {
        Self::new::<T>(Kind::Record(fields))
    }

    pub fn enumeration<T: 'static>(name: &'static str, variants: &[&'static str]) -> Self {
        Self::new::<T>(Kind::Enumeration(variants.to_vec())).named(name)
    }

    /// A named type sharing `Inner`'s shape, e.g. `struct Meters(f64)`.
    pub fn newtype<T: 'static, Inner: Describe>(name: &'static str) -> Self {
        let inner = Inner::describe();
        Self::new::<T>(inner.kind).named(name)
    }

    pub fn uri<T: 'static>() -> Self {
        Self::new::<T>(Kind::Uri)
    }

    pub fn unsupported<T: 'static + ?Sized>(what: &'static str) -> Self {
        Self::new::<T>(Kind::Unsupported(what))
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn is<T: 'static + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, Kind::Record(_))
    }

    /// Strip optional and pointer layers.
    pub fn pointee(self) -> TypeDesc {
        match self.kind {
            Kind::Optional(inner) | Kind::Pointer(inner) => inner.get().pointee(),
            _ => self,
        }
    }

    /// Human-readable name for error messages.
    pub fn display_name(&self) -> &'static str {
        self.name.unwrap_or(self.type_name)
    }
}

/// One declared field of a record, with its serialization settings and its
/// schema annotations.
#[derive(Debug, Clone)]
pub struct FieldDesc {
    /// Rust identifier.
    pub ident: &'static str,
    /// Wire name, when it differs from the identifier.
    pub rename: Option<&'static str>,
    /// Never serialized.
    pub skip: bool,
    /// Serialized only when non-empty; such a field is not inferred required.
    pub omit_empty: bool,
    pub public: bool,
    /// Embedded member whose fields are promoted into the parent.
    pub embedded: bool,
    pub annotation: Option<&'static str>,
    pub description: Option<&'static str>,
    pub extras: Option<&'static str>,
    pub ty: TypeRef,
}

impl FieldDesc {
    pub fn new<T: Describe>(ident: &'static str) -> Self {
        Self {
            ident,
            rename: None,
            skip: false,
            omit_empty: false,
            public: true,
            embedded: false,
            annotation: None,
            description: None,
            extras: None,
            ty: TypeRef::of::<T>(),
        }
    }

    pub fn embed<T: Describe>(ident: &'static str) -> Self {
        Self { embedded: true, ..Self::new::<T>(ident) }
    }

    pub fn rename(mut self, wire_name: &'static str) -> Self {
        self.rename = Some(wire_name);
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    /// Schema annotation, e.g. `"required,minLength=1"`.
    pub fn tag(mut self, annotation: &'static str) -> Self {
        self.annotation = Some(annotation);
        self
    }

    pub fn describe(mut self, text: &'static str) -> Self {
        self.description = Some(text);
        self
    }

    /// Extension keywords, e.g. `"x-owner=ops,x-tier=gold"`.
    pub fn extras(mut self, extras: &'static str) -> Self {
        self.extras = Some(extras);
        self
    }

    pub fn output_name(&self) -> &'static str {
        self.rename.unwrap_or(self.ident)
    }
}

/// Supplies the structural description of a type.
pub trait Describe: 'static {
    fn describe() -> TypeDesc;
}

macro_rules! describe_leaf {
    ($kind:ident => $($t:ty),+ $(,)?) => {
        $(
            impl Describe for $t {
                fn describe() -> TypeDesc {
                    TypeDesc::new::<$t>(Kind::$kind)
                }
            }
        )+
    };
}

describe_leaf!(Bool => bool);
describe_leaf!(Integer => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
describe_leaf!(Float => f32, f64);
describe_leaf!(String => String, char, &'static str);
describe_leaf!(IpAddr => std::net::IpAddr, std::net::Ipv4Addr);
describe_leaf!(Uri => url::Url);
describe_leaf!(Any => serde_json::Value);

impl<Tz: chrono::TimeZone + 'static> Describe for chrono::DateTime<Tz> {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(Kind::Timestamp)
    }
}

fn is_byte<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<u8>()
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeDesc {
        if is_byte::<T>() {
            return TypeDesc::new::<Self>(Kind::Bytes);
        }
        TypeDesc::new::<Self>(Kind::Array { items: TypeRef::of::<T>(), len: None })
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDesc {
        if is_byte::<T>() {
            return TypeDesc::new::<Self>(Kind::Bytes);
        }
        TypeDesc::new::<Self>(Kind::Array { items: TypeRef::of::<T>(), len: Some(N) })
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(Kind::Optional(TypeRef::of::<T>()))
    }
}

macro_rules! describe_pointer {
    ($($p:ident),+) => {
        $(
            impl<T: Describe> Describe for $p<T> {
                fn describe() -> TypeDesc {
                    TypeDesc::new::<Self>(Kind::Pointer(TypeRef::of::<T>()))
                }
            }
        )+
    };
}

describe_pointer!(Box, Rc, Arc);

macro_rules! describe_map {
    ($($m:ident),+) => {
        $(
            impl<V: Describe, S: 'static> Describe for $m<String, V, S> {
                fn describe() -> TypeDesc {
                    TypeDesc::new::<Self>(Kind::Map { values: TypeRef::of::<V>() })
                }
            }
        )+
    };
}

describe_map!(HashMap, IndexMap);

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn describe() -> TypeDesc {
        TypeDesc::new::<Self>(Kind::Map { values: TypeRef::of::<V>() })
    }
}

impl<T: 'static> Describe for std::sync::mpsc::Sender<T> {
    fn describe() -> TypeDesc {
        TypeDesc::unsupported::<Self>("channel")
    }
}

impl<T: 'static> Describe for std::sync::mpsc::Receiver<T> {
    fn describe() -> TypeDesc {
        TypeDesc::unsupported::<Self>("channel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node;

    impl Describe for Node {
        fn describe() -> TypeDesc {
            TypeDesc::record::<Self>("Node", vec![
                FieldDesc::new::<Option<Box<Node>>>("next"),
                FieldDesc::new::<Vec<Node>>("children"),
            ])
        }
    }

    #[test]
    fn byte_collections_are_blobs() {
        assert!(matches!(Vec::<u8>::describe().kind, Kind::Bytes));
        assert!(matches!(<[u8; 20]>::describe().kind, Kind::Bytes));
        assert!(matches!(Vec::<u16>::describe().kind, Kind::Array { len: None, .. }));
        assert!(matches!(<[i32; 3]>::describe().kind, Kind::Array { len: Some(3), .. }));
    }

    #[test]
    fn self_reference_is_lazy() {
        let desc = Node::describe();
        let Kind::Record(fields) = &desc.kind else { panic!("not a record") };
        let next = fields[0].ty.get().pointee();
        assert!(next.is::<Node>());
        assert_eq!(next.name, Some("Node"));
    }

    #[test]
    fn newtype_keeps_identity_but_borrows_shape() {
        struct Meters;
        let desc = TypeDesc::newtype::<Meters, f64>("Meters");
        assert!(desc.is::<Meters>());
        assert!(matches!(desc.kind, Kind::Float));
        assert_eq!(desc.display_name(), "Meters");
    }

    #[test]
    fn output_name_prefers_rename() {
        let field = FieldDesc::new::<i64>("ID").rename("id");
        assert_eq!(field.output_name(), "id");
        assert_eq!(FieldDesc::new::<i64>("Count").output_name(), "Count");
    }
}
