use serde::de::DeserializeOwned;

use crate::error::{ReflectError, ReflectResult};
use crate::schema::Document;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> ReflectResult<T> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_decode_error)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> ReflectResult<T> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_decode_error)
}

fn into_decode_error(err: serde_path_to_error::Error<serde_json::Error>) -> ReflectError {
    let path = err.path().to_string();
    ReflectError::Decode { path, source: err.into_inner() }
}

impl Document {
    /// Decode a document previously produced by this crate (or a pinned fixture).
    pub fn from_json_str(src: &str) -> ReflectResult<Self> {
        from_str_with_path(src)
    }

    pub fn from_json_slice(bytes: &[u8]) -> ReflectResult<Self> {
        from_slice_with_path(bytes)
    }
}
