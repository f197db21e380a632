//! Error types for the protocol layer.
//!
//! Each Taskboard crate defines its own error enum. A `ProtocolError`
//! always means the bytes were wrong (could not be encoded, could not
//! be decoded, or decoded into something that breaks API rules), never
//! that the network was.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: an HTML error page where JSON was expected,
    /// missing required fields, or a truncated body.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload decoded but is missing something the API promises,
    /// e.g. an auth response without a token.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
