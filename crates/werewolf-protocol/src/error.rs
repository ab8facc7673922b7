//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or parsing identities.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing `type` tag,
    /// or fields of the wrong shape.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A player token or game id that is not a valid UUID.
    #[error("invalid id: {0}")]
    InvalidId(String),
}
