//! Error types for the protocol layer.
//!
//! Each crate in Cardczar defines its own error enum. A `ProtocolError`
//! always means the problem is in the shape of a frame, never in game
//! rules: rule violations are not errors at all (see `cardczar-game`).

/// Errors that can occur while encoding or parsing wire events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, wrong data types, or truncated
    /// frames.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame named an event the server does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Required fields were absent or `null`.
    ///
    /// This is the only protocol error the client hears about: the
    /// acting session receives a `notification` listing the names.
    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The frame is well-formed JSON but violates the event contract.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
