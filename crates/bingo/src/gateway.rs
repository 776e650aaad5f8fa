//! The session gateway: connection intents in, room operations out.
//!
//! The gateway owns the session table and each connected player's
//! outbound channel. It turns `createRoom` / `joinRoom` / `markNumber`
//! into registry calls and every room-level failure into exactly one
//! `roomError` or `invalidMark` for the caller. Successful operations
//! need no reply from here; the room actor already notified everyone.

use std::collections::HashMap;
use std::sync::Arc;

use bingo_protocol::{
    ClientIntent, Number, PROTOCOL_VERSION, PlayerId, PlayerSlot, RoomKey, ServerNotification,
};
use bingo_room::{PlayerSender, RoomError, RoomRegistry};
use bingo_session::{SessionError, SessionManager};
use tokio::sync::{Mutex, mpsc};

use crate::BingoError;

/// Connected players: their sessions and where to send their frames.
#[derive(Default)]
struct Clients {
    sessions: SessionManager,
    senders: HashMap<PlayerId, PlayerSender>,
}

/// Routes player intents to rooms and reports failures back.
///
/// Shared by every connection task. The client table lock is never held
/// while a room is being asked for something.
pub struct Gateway {
    clients: Mutex<Clients>,
    rooms: Arc<RoomRegistry>,
}

impl Gateway {
    pub fn new(rooms: Arc<RoomRegistry>) -> Self {
        Self {
            clients: Mutex::new(Clients::default()),
            rooms,
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Registers a new connection and returns the receiving end of its
    /// outbound channel. `welcome` is already queued on it.
    pub async fn connect(
        &self,
        player_id: PlayerId,
    ) -> Result<mpsc::UnboundedReceiver<ServerNotification>, BingoError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut clients = self.clients.lock().await;
        clients.sessions.create(player_id)?;
        let _ = tx.send(ServerNotification::Welcome {
            player_id,
            version: PROTOCOL_VERSION,
        });
        clients.senders.insert(player_id, tx);
        Ok(rx)
    }

    /// Handles one decoded intent from `player_id`.
    ///
    /// Room-level failures are reported to the player and are not errors
    /// here. `heartbeat` is answered by the connection itself.
    pub async fn handle_intent(
        &self,
        player_id: PlayerId,
        intent: ClientIntent,
    ) -> Result<(), BingoError> {
        match intent {
            ClientIntent::CreateRoom { room_key } => self.create_room(player_id, &room_key).await,
            ClientIntent::JoinRoom { room_key } => self.join_room(player_id, &room_key).await,
            ClientIntent::MarkNumber { room_key, number } => {
                self.mark_number(player_id, &room_key, number).await
            }
            ClientIntent::Disconnect { reason } => {
                tracing::info!(%player_id, %reason, "client asked to disconnect");
                self.disconnect(player_id).await
            }
            ClientIntent::Heartbeat { .. } => Ok(()),
        }
    }

    async fn create_room(&self, player_id: PlayerId, raw_key: &str) -> Result<(), BingoError> {
        let Some(key) = self.parse_key(player_id, raw_key).await else {
            return Ok(());
        };
        let Some(sender) = self.seat(player_id, &key, PlayerSlot::Creator).await? else {
            return Ok(());
        };

        if let Err(err) = self.rooms.create_room(key.clone(), player_id, sender).await {
            self.release(player_id, &key).await;
            self.reject(player_id, &err).await;
        }
        Ok(())
    }

    async fn join_room(&self, player_id: PlayerId, raw_key: &str) -> Result<(), BingoError> {
        let Some(key) = self.parse_key(player_id, raw_key).await else {
            return Ok(());
        };
        let Some(sender) = self.seat(player_id, &key, PlayerSlot::Joiner).await? else {
            return Ok(());
        };

        if let Err(err) = self.rooms.join_room(&key, player_id, sender).await {
            self.release(player_id, &key).await;
            self.reject(player_id, &err).await;
        }
        Ok(())
    }

    async fn mark_number(
        &self,
        player_id: PlayerId,
        raw_key: &str,
        number: Number,
    ) -> Result<(), BingoError> {
        let Some(key) = self.parse_key(player_id, raw_key).await else {
            return Ok(());
        };
        if let Err(err) = self.rooms.mark_number(&key, player_id, number).await {
            self.reject(player_id, &err).await;
        }
        Ok(())
    }

    /// Tears down everything `player_id` owns: the session, the outbound
    /// channel and, if they were seated, the whole room.
    ///
    /// Safe to call more than once; later calls find nothing to do.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), BingoError> {
        let session = {
            let mut clients = self.clients.lock().await;
            clients.senders.remove(&player_id);
            match clients.sessions.disconnect(player_id) {
                Ok(session) => session,
                Err(SessionError::NotFound(_)) => return Ok(()),
                Err(err) => return Err(err.into()),
            }
        };

        let Some(key) = session.room_key() else {
            return Ok(());
        };
        match self.rooms.remove_player(key, player_id).await {
            Ok(remaining) => {
                let mut clients = self.clients.lock().await;
                for other in remaining {
                    clients.sessions.unbind_from(other, key);
                }
            }
            // The other player got there first.
            Err(RoomError::NotFound(_) | RoomError::Unavailable(_)) => {
                tracing::debug!(%player_id, room_key = %key, "room already gone");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    /// Number of connected players.
    pub async fn connected(&self) -> usize {
        self.clients.lock().await.sessions.len()
    }

    /// The room `player_id` is seated in, if any.
    pub async fn room_of(&self, player_id: PlayerId) -> Option<RoomKey> {
        self.clients
            .lock()
            .await
            .sessions
            .room_of(&player_id)
            .cloned()
    }

    /// Validates a client-supplied key, reporting a bad one.
    async fn parse_key(&self, player_id: PlayerId, raw: &str) -> Option<RoomKey> {
        match RoomKey::parse(raw) {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::debug!(%player_id, %err, "rejected room key");
                self.notify(
                    player_id,
                    ServerNotification::RoomError {
                        reason: err.to_string(),
                    },
                )
                .await;
                None
            }
        }
    }

    /// Binds the player to `key` before the room sees them, so a close
    /// racing the create or join always finds the binding to clear.
    ///
    /// A binding to a room that no longer exists is stale: the room closed
    /// and the leaver's cleanup has not reached this player yet. It is
    /// cleared and the bind retried once.
    ///
    /// Returns the player's outbound sender, or `None` (already reported)
    /// when they are seated elsewhere.
    async fn seat(
        &self,
        player_id: PlayerId,
        key: &RoomKey,
        slot: PlayerSlot,
    ) -> Result<Option<PlayerSender>, BingoError> {
        let mut checked_stale = false;
        loop {
            let mut clients = self.clients.lock().await;
            let current = match clients.sessions.bind_room(player_id, key.clone(), slot) {
                Ok(()) => {
                    let sender = clients
                        .senders
                        .get(&player_id)
                        .cloned()
                        .ok_or(SessionError::NotFound(player_id))?;
                    return Ok(Some(sender));
                }
                Err(SessionError::AlreadyInRoom { room_key, .. }) => room_key,
                Err(err) => return Err(err.into()),
            };

            if !checked_stale {
                drop(clients);
                checked_stale = true;
                if !self.rooms.contains(&current).await {
                    self.release(player_id, &current).await;
                }
                continue;
            }

            tracing::debug!(%player_id, %current, requested = %key, "already in a room");
            if let Some(sender) = clients.senders.get(&player_id) {
                let _ = sender.send(ServerNotification::RoomError {
                    reason: format!("already in room {current}"),
                });
            }
            return Ok(None);
        }
    }

    /// Undoes [`seat`](Self::seat) after the room refused the player.
    async fn release(&self, player_id: PlayerId, key: &RoomKey) {
        self.clients
            .lock()
            .await
            .sessions
            .unbind_from(player_id, key);
    }

    async fn reject(&self, player_id: PlayerId, err: &RoomError) {
        tracing::debug!(%player_id, %err, "request rejected");
        self.notify(player_id, rejection(err)).await;
    }

    async fn notify(&self, player_id: PlayerId, notification: ServerNotification) {
        if let Some(sender) = self.clients.lock().await.senders.get(&player_id) {
            let _ = sender.send(notification);
        }
    }
}

/// The single notification a failed request produces.
///
/// A room that stopped mid-request is reported as not found, the same as
/// one that was already gone.
pub fn rejection(err: &RoomError) -> ServerNotification {
    match err {
        err if err.is_invalid_mark() => ServerNotification::InvalidMark {
            reason: err.to_string(),
        },
        RoomError::Unavailable(key) => ServerNotification::RoomError {
            reason: RoomError::NotFound(key.clone()).to_string(),
        },
        err => ServerNotification::RoomError {
            reason: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> RoomKey {
        RoomKey::parse(raw).unwrap()
    }

    #[test]
    fn test_rejection_for_mark_errors_is_invalid_mark() {
        assert_eq!(
            rejection(&RoomError::NumberNotYetDrawn(7)),
            ServerNotification::InvalidMark {
                reason: "number 7 has not been drawn yet".into()
            }
        );
        assert_eq!(
            rejection(&RoomError::GameOver),
            ServerNotification::InvalidMark {
                reason: "game is over".into()
            }
        );
    }

    #[test]
    fn test_rejection_for_room_errors_is_room_error() {
        assert_eq!(
            rejection(&RoomError::RoomFull(key("R1"))),
            ServerNotification::RoomError {
                reason: "room R1 is full".into()
            }
        );
        assert_eq!(
            rejection(&RoomError::DuplicateRoom(key("R3"))),
            ServerNotification::RoomError {
                reason: "room R3 already exists".into()
            }
        );
    }

    #[test]
    fn test_rejection_reports_unavailable_as_not_found() {
        assert_eq!(
            rejection(&RoomError::Unavailable(key("R2"))),
            ServerNotification::RoomError {
                reason: "room R2 not found".into()
            }
        );
    }
}
