//! Error types for the protocol layer.
//!
//! A `ProtocolError` means the problem is in the bytes or in a field's
//! shape, never in room state.

/// Errors raised while encoding, decoding or validating wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a value failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes are not a valid message: malformed JSON, an unknown
    /// `type`, a missing field, or a number of the wrong sign.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room key was empty or too long.
    #[error("invalid room key: {0}")]
    InvalidRoomKey(String),

    /// A player slot other than 1 or 2.
    #[error("invalid player slot: {0}")]
    InvalidSlot(u8),
}
