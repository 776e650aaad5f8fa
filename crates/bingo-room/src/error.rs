//! Error types for the room layer.

use bingo_card::{CardError, Number};
use bingo_protocol::{PlayerId, RoomKey};

/// Errors from room and registry operations.
///
/// All of these are per-request: the gateway reports them to the caller
/// and the room carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// Another live room already uses this key.
    #[error("room {0} already exists")]
    DuplicateRoom(RoomKey),

    #[error("room {0} not found")]
    NotFound(RoomKey),

    /// Both seats are taken, or the game has moved past the lobby.
    #[error("room {0} is full")]
    RoomFull(RoomKey),

    #[error("player {0} is not in room {1}")]
    NotInRoom(PlayerId, RoomKey),

    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomKey),

    /// The game has a winner or ran out of numbers.
    #[error("game is over")]
    GameOver,

    #[error("number {number} is outside 1..={range_max}")]
    NumberOutOfRange { number: Number, range_max: Number },

    /// Players may only mark numbers that have been drawn.
    #[error("number {0} has not been drawn yet")]
    NumberNotYetDrawn(Number),

    /// The room actor has stopped or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomKey),
}

impl RoomError {
    /// Whether this is a rejected mark (as opposed to a room-level failure).
    pub fn is_invalid_mark(&self) -> bool {
        matches!(
            self,
            Self::GameOver | Self::NumberOutOfRange { .. } | Self::NumberNotYetDrawn(_)
        )
    }
}

/// Startup configuration errors. Fatal where they occur.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid number range: {0}")]
    Range(#[from] CardError),

    #[error("room channel size must be at least 1")]
    ZeroChannelSize,
}
