//! Error types for reflection.

use thiserror::Error;

use crate::annotation::AnnotationError;

/// Everything that can abort a reflection call. Reflection is all-or-nothing,
/// so none of these come with a partial schema.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// Unparseable constraint value, unknown key, or a keyword that does not
    /// fit the field's type.
    #[error("malformed annotation on `{path}`: {source}")]
    MalformedAnnotation {
        path: String,
        #[source]
        source: AnnotationError,
    },

    /// A type with no structural shape and no override.
    #[error("unsupported type `{type_name}` at `{path}`: {reason}")]
    UnsupportedType {
        path: String,
        type_name: &'static str,
        reason: String,
    },

    /// The type mapper refused the type.
    #[error("type mapper rejected `{type_name}` at `{path}`: {reason}")]
    OverrideRejected {
        path: String,
        type_name: &'static str,
        reason: String,
    },

    /// Two distinct types declared the same definition name.
    #[error("definition name `{name}` is claimed by both `{first}` and `{second}`")]
    NameCollision {
        name: String,
        first: &'static str,
        second: &'static str,
    },

    /// A serialized document could not be decoded.
    #[error("failed to decode schema document at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for reflection operations.
pub type ReflectResult<T> = Result<T, ReflectError>;
