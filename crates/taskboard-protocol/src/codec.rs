//! Codec trait and implementations for serializing/deserializing bodies.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The dispatcher and services don't care HOW bodies are serialized:
//! they go through the [`Codec`] trait. The REST API speaks JSON, so
//! [`JsonCodec`] is the one in use today.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between tasks (the client is
///   shared behind an `Arc` across every caller).
/// - `'static` → the codec owns everything it needs.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the result doesn't
/// borrow from the input bytes, so the response buffer can be dropped
/// right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// The `Content-Type` this codec produces.
    fn content_type(&self) -> &'static str;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use taskboard_protocol::{Codec, Credentials, JsonCodec};
///
/// let codec = JsonCodec;
/// let creds = Credentials::new("ada@example.com", "hunter2");
///
/// let bytes = codec.encode(&creds).unwrap();
/// let decoded: Credentials = codec.decode(&bytes).unwrap();
/// assert_eq!(creds, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
