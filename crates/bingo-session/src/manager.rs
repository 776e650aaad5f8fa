//! The session manager: every connected player and the room they sit in.
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain `HashMap` wrapper and is not thread-safe by
//! itself. The gateway owns it behind a mutex and never holds that lock
//! across a room round-trip.

use std::collections::HashMap;

use bingo_protocol::{PlayerId, PlayerSlot, RoomKey};

use crate::{Session, SessionError, SessionState};

/// Tracks all connected players.
///
/// ```text
/// create() ──→ [Lobby] ──bind_room()──→ [InRoom] ──unbind()──→ [Lobby]
///                 │                        │
///                 └──────disconnect()──────┴──→ (removed)
/// ```
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<PlayerId, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly accepted connection.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the player already has a session.
    pub fn create(&mut self, player_id: PlayerId) -> Result<&Session, SessionError> {
        use std::collections::hash_map::Entry;

        match self.sessions.entry(player_id) {
            Entry::Occupied(_) => Err(SessionError::AlreadyConnected(player_id)),
            Entry::Vacant(slot) => {
                tracing::info!(%player_id, "session created");
                Ok(slot.insert(Session::new(player_id)))
            }
        }
    }

    /// Fails if the player is missing or already seated somewhere.
    pub fn ensure_in_lobby(&self, player_id: PlayerId) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        match &session.state {
            SessionState::Lobby => Ok(()),
            SessionState::InRoom { room_key, .. } => Err(SessionError::AlreadyInRoom {
                player: player_id,
                room_key: room_key.clone(),
            }),
        }
    }

    /// Records that the player now sits in `room_key` as `slot`.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if the player has no session
    /// - [`SessionError::AlreadyInRoom`] if they are seated elsewhere
    pub fn bind_room(
        &mut self,
        player_id: PlayerId,
        room_key: RoomKey,
        slot: PlayerSlot,
    ) -> Result<(), SessionError> {
        self.ensure_in_lobby(player_id)?;
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;

        tracing::debug!(%player_id, %room_key, %slot, "session bound to room");
        session.state = SessionState::InRoom { room_key, slot };
        Ok(())
    }

    /// Returns the player to the lobby, handing back the room they left.
    ///
    /// Unknown players and players already in the lobby yield `None`.
    pub fn unbind(&mut self, player_id: PlayerId) -> Option<RoomKey> {
        let session = self.sessions.get_mut(&player_id)?;
        match std::mem::replace(&mut session.state, SessionState::Lobby) {
            SessionState::InRoom { room_key, .. } => {
                tracing::debug!(%player_id, %room_key, "session returned to lobby");
                Some(room_key)
            }
            SessionState::Lobby => None,
        }
    }

    /// Returns the player to the lobby only if they sit in `room_key`.
    ///
    /// Used when a room closes underneath a player, so a later binding to
    /// a new room under the same key is left alone.
    pub fn unbind_from(&mut self, player_id: PlayerId, room_key: &RoomKey) -> bool {
        match self.sessions.get_mut(&player_id) {
            Some(session) if session.room_key() == Some(room_key) => {
                session.state = SessionState::Lobby;
                tracing::debug!(%player_id, %room_key, "session released by room");
                true
            }
            _ => false,
        }
    }

    /// Removes the player's session and returns it.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        tracing::info!(
            %player_id,
            room_key = ?session.room_key(),
            connected_for_ms = session.connected_at.elapsed().as_millis() as u64,
            "session removed"
        );
        Ok(session)
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// The room the player is seated in, if any.
    pub fn room_of(&self, player_id: &PlayerId) -> Option<&RoomKey> {
        self.sessions.get(player_id)?.room_key()
    }

    /// Number of connected players.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
