//! The per-connection session record.

use std::time::Instant;

use bingo_protocol::{PlayerId, PlayerSlot, RoomKey};

/// Where a connected player currently is.
///
/// ```text
///   Lobby ──(create / join)──→ InRoom ──(room closed / left)──→ Lobby
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, not seated anywhere.
    Lobby,

    /// Seated in `room_key` as `slot`.
    InRoom { room_key: RoomKey, slot: PlayerSlot },
}

/// The server's record of one connected player.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,
    pub state: SessionState,
    /// When the connection was accepted.
    pub connected_at: Instant,
}

impl Session {
    pub(crate) fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            state: SessionState::Lobby,
            connected_at: Instant::now(),
        }
    }

    /// The room this player is seated in, if any.
    pub fn room_key(&self) -> Option<&RoomKey> {
        match &self.state {
            SessionState::InRoom { room_key, .. } => Some(room_key),
            SessionState::Lobby => None,
        }
    }
}
