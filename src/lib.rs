//! Derive JSON Schema (draft-04) documents from Rust type descriptors.
//!
//! Types describe their shape through [`Describe`]; fields carry
//! serialization settings plus a schema annotation string such as
//! `required,minLength=1,enum=red,enum=green`. A [`Reflector`] walks the
//! descriptor, parses annotations, and assembles a [`Document`] where named
//! records become `definitions` referenced by `$ref`.
//!
//! ```
//! use json_reflect_schema::{Describe, FieldDesc, Reflector, TypeDesc};
//!
//! struct Account;
//!
//! impl Describe for Account {
//!     fn describe() -> TypeDesc {
//!         TypeDesc::record::<Self>("Account", vec![
//!             FieldDesc::new::<i64>("id"),
//!             FieldDesc::new::<String>("name").tag("required,minLength=1"),
//!         ])
//!     }
//! }
//!
//! let doc = Reflector::new()
//!     .required_from_annotation_only(true)
//!     .reflect::<Account>()
//!     .unwrap();
//! assert_eq!(doc.definition("Account").unwrap().required, vec!["name"]);
//! ```
pub mod annotation;
pub mod describe;
pub mod error;
pub mod path_de;
pub mod reflect;
pub mod registry;
pub mod resolve;
pub mod samples;
pub mod schema;

pub use annotation::{AnnotationError, Annotations};
pub use describe::{Describe, FieldDesc, Kind, TypeDesc, TypeRef};
pub use error::{ReflectError, ReflectResult};
pub use reflect::{Reflector, ReflectorConfig};
pub use registry::{DefinitionRegistry, Resolution};
pub use resolve::{Mapping, TypeMapper};
pub use schema::{Document, InstanceType, Media, Schema};
