//! Room registry: the process-wide map from room key to room actor.

use std::collections::HashMap;

use bingo_card::{Card, CardSpec, Number};
use bingo_protocol::{PlayerId, RoomKey};
use tokio::sync::Mutex;

use crate::game::{BingoRoom, PLAYER_LEFT_REASON};
use crate::room::spawn_room;
use crate::{BingoConfig, ConfigError, Joined, PlayerSender, RoomError, RoomHandle, RoomInfo};

/// Owns every live room.
///
/// The key map sits behind an async mutex that is held only to look up,
/// insert or remove a handle, never while waiting on a room. Work on a
/// room happens in its actor, so rooms with different keys never wait on
/// each other and operations on the same key are serialized by that
/// room's command queue.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomKey, RoomHandle>>,
    config: BingoConfig,
    spec: CardSpec,
}

impl RoomRegistry {
    /// Builds an empty registry, validating `config` first.
    pub fn new(config: BingoConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let spec = config.card_spec()?;
        Ok(Self {
            rooms: Mutex::new(HashMap::new()),
            config,
            spec,
        })
    }

    pub fn config(&self) -> &BingoConfig {
        &self.config
    }

    /// Opens room `key` with `creator` in slot 1 and returns their card.
    ///
    /// `roomCreated` and `gameInfo` are queued on `sender` before the room
    /// becomes visible, so the creator always sees them before anything a
    /// joiner triggers.
    pub async fn create_room(
        &self,
        key: RoomKey,
        creator: PlayerId,
        sender: PlayerSender,
    ) -> Result<Card, RoomError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&key) {
            tracing::debug!(room_key = %key, %creator, "duplicate room key");
            return Err(RoomError::DuplicateRoom(key));
        }

        let (room, outbox) = BingoRoom::open(key.clone(), self.spec, creator, &mut rand::rng());
        for (recipient, notification) in outbox {
            if recipient.includes(creator) {
                let _ = sender.send(notification);
            }
        }
        let card = room.creator().card.clone();

        let handle = spawn_room(room, (creator, sender), &self.config);
        rooms.insert(key.clone(), handle);
        tracing::info!(room_key = %key, %creator, rooms = rooms.len(), "room created");
        Ok(card)
    }

    /// Seats `player` in slot 2 of room `key`, which starts the game.
    pub async fn join_room(
        &self,
        key: &RoomKey,
        player: PlayerId,
        sender: PlayerSender,
    ) -> Result<Joined, RoomError> {
        self.handle(key).await?.join(player, sender).await
    }

    /// Marks `number` on `player`'s card in room `key`.
    pub async fn mark_number(
        &self,
        key: &RoomKey,
        player: PlayerId,
        number: Number,
    ) -> Result<Card, RoomError> {
        self.handle(key).await?.mark(player, number).await
    }

    /// Destroys room `key` because `player` left.
    ///
    /// A player who is not seated in `key` gets `NotInRoom` and the room
    /// is not touched. Otherwise the key is released, so lookups fail with
    /// `NotFound` from here on, and the actor tells the other members and
    /// stops. Returns those other members.
    pub async fn remove_player(
        &self,
        key: &RoomKey,
        player: PlayerId,
    ) -> Result<Vec<PlayerId>, RoomError> {
        let handle = self.handle(key).await?;
        if !handle.info().await?.players.contains(&player) {
            return Err(RoomError::NotInRoom(player, key.clone()));
        }

        // A seated player stays seated until the room closes, so only a
        // concurrent close can have happened since the check.
        {
            let mut rooms = self.rooms.lock().await;
            match rooms.get(key) {
                Some(current) if current.same_room(&handle) => {
                    rooms.remove(key);
                }
                _ => return Err(RoomError::NotFound(key.clone())),
            }
        }

        let remaining = handle.close(Some(player), PLAYER_LEFT_REASON).await?;
        tracing::info!(room_key = %key, %player, notified = remaining.len(), "room destroyed");
        Ok(remaining)
    }

    /// Closes every room, telling all members. Used on shutdown.
    pub async fn close_all(&self, reason: &str) {
        let handles: Vec<RoomHandle> = self.rooms.lock().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            if let Err(err) = handle.close(None, reason).await {
                tracing::debug!(room_key = %handle.room_key(), %err, "room already stopped");
            }
        }
    }

    pub async fn room_info(&self, key: &RoomKey) -> Result<RoomInfo, RoomError> {
        self.handle(key).await?.info().await
    }

    /// Whether a live room is registered under `key`.
    pub async fn contains(&self, key: &RoomKey) -> bool {
        self.rooms.lock().await.contains_key(key)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn room_keys(&self) -> Vec<RoomKey> {
        self.rooms.lock().await.keys().cloned().collect()
    }

    /// Clones the handle for `key`. The registry lock is released before
    /// the caller sends anything, and a handle kept past the room's close
    /// answers `Unavailable`.
    pub async fn handle(&self, key: &RoomKey) -> Result<RoomHandle, RoomError> {
        self.rooms
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(key.clone()))
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

