use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::de::value::{BytesDeserializer, SeqDeserializer, StringDeserializer};

use crate::client::ApiClientError;

/// A parsed response body, before it is decoded into a typed value.
///
/// The variant depends on the response content type, see
/// [`ApiResponse`](crate::ApiResponse) for the classification rules.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Body {
    /// JSON content.
    Json(serde_json::Value),
    /// Text content (lossy UTF-8).
    Text(String),
    /// Any other content, kept as raw bytes.
    Bytes(Bytes),
}

impl Body {
    /// Returns the body as JSON if it's JSON content.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the body as text if it's text content.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the body as bytes if it's binary content.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Decodes the body into `T`.
    ///
    /// JSON bodies go through `serde_json`, text bodies are offered as a string,
    /// binary bodies as bytes (use [`bytes::Bytes`] to keep them untouched), then as a
    /// sequence of `u8` for the types that reject bytes, such as [`serde_json::Value`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::JsonError`] with the path of the failing field.
    pub fn decode<T>(&self) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let result = match self {
            Self::Json(value) => serde_path_to_error::deserialize(value.clone()),
            Self::Text(text) => serde_path_to_error::deserialize(StringDeserializer::<
                serde_json::Error,
            >::new(text.clone())),
            Self::Bytes(bytes) => {
                serde_path_to_error::deserialize(BytesDeserializer::<serde_json::Error>::new(bytes))
                    .or_else(|_| {
                        serde_path_to_error::deserialize(
                            SeqDeserializer::<_, serde_json::Error>::new(bytes.iter().copied()),
                        )
                    })
            }
        };

        result.map_err(|err| ApiClientError::JsonError {
            path: err.path().to_string(),
            error: err.into_inner(),
            body: self.to_string_lossy(),
        })
    }

    fn to_string_lossy(&self) -> String {
        match self {
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}
