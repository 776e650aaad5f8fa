//! Unified error type for the bingo server.

use bingo_protocol::ProtocolError;
use bingo_room::{ConfigError, RoomError};
use bingo_session::SessionError;
use bingo_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
/// Per-request room failures normally never get here: the gateway turns
/// them into `roomError` / `invalidMark` notifications.
#[derive(Debug, thiserror::Error)]
pub enum BingoError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// Bad startup configuration. Fatal.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use bingo_card::CardError;
    use bingo_protocol::{PlayerId, RoomKey};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let bingo_err: BingoError = err.into();
        assert!(matches!(bingo_err, BingoError::Transport(_)));
        assert!(bingo_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidRoomKey("".into());
        let bingo_err: BingoError = err.into();
        assert!(matches!(bingo_err, BingoError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NotFound(PlayerId(4));
        let bingo_err: BingoError = err.into();
        assert!(matches!(bingo_err, BingoError::Session(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomKey::parse("R1").unwrap());
        let bingo_err: BingoError = err.into();
        assert!(matches!(bingo_err, BingoError::Room(_)));
        assert_eq!(bingo_err.to_string(), "room R1 not found");
    }

    #[test]
    fn test_from_config_error() {
        let err = ConfigError::Range(CardError::RangeTooSmall {
            range_max: 10,
            cells: 25,
        });
        let bingo_err: BingoError = err.into();
        assert!(matches!(bingo_err, BingoError::Config(_)));
        assert!(bingo_err.to_string().starts_with("configuration error"));
    }
}
