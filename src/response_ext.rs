// response_ext.rs

use crate::error::ArkimeError;
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// Extension trait for working with `http::Response<Bytes>`.
pub trait ResponseExt {
    /// Reads the response body as UTF-8 text, lossy on invalid sequences.
    fn text(&self) -> String;

    /// Deserializes the response body as JSON.
    fn json<T: DeserializeOwned>(&self) -> Result<T, ArkimeError>;

    /// Reads a header as a string, if present and valid.
    fn header_str(&self, name: &str) -> Option<&str>;
}

impl ResponseExt for http::Response<Bytes> {
    fn text(&self) -> String {
        String::from_utf8_lossy(self.body()).into_owned()
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, ArkimeError> {
        let body = self.body();

        if body.is_empty() {
            return Err(ArkimeError::SerializationError("Empty response body".to_string()));
        }

        serde_json::from_slice::<T>(body).map_err(|e| {
            let preview_len = body.len().min(100);
            let preview = String::from_utf8_lossy(&body[..preview_len]);
            ArkimeError::SerializationError(format!("Failed to deserialize JSON: {}. Body preview: {}", e, preview))
        })
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }
}
