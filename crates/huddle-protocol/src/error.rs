//! Error types for the protocol layer.
//!
//! Each crate in Huddle defines its own error enum. A `ProtocolError`
//! always means a serialization problem, never networking or registry
//! state, which keeps the handler's "malformed frame" branch honest.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, wrong
    /// data types. For inbound client frames this is not fatal; the
    /// handler drops the single offending message.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but is invalid at the protocol level, e.g. an
    /// empty event name.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
