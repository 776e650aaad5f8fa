//! Error types for the session layer.

use bingo_protocol::{PlayerId, RoomKey};

/// Errors from [`SessionManager`](crate::SessionManager) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player. Either they never
    /// connected or their session was already removed.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// The player already has a live session.
    #[error("player {0} already has an active session")]
    AlreadyConnected(PlayerId),

    /// The player is seated in a room and may not take a second one.
    #[error("player {player} is already in room {room_key}")]
    AlreadyInRoom { player: PlayerId, room_key: RoomKey },
}
