//! Byte codecs for wire types.
//!
//! The gateway is generic over [`Codec`], so the encoding can change
//! without touching room or session code. [`JsonCodec`] is the default
//! and the only one browser clients speak today.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts wire types to and from bytes.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Parses one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] over `serde_json`.
///
/// ```rust
/// use bingo_protocol::{Codec, Envelope, JsonCodec, ServerNotification};
///
/// let codec = JsonCodec;
/// let envelope = Envelope {
///     seq: 1,
///     timestamp: 5000,
///     payload: ServerNotification::GameStarted,
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope<ServerNotification> = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
