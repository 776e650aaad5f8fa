//! Wire types for the bingo protocol.
//!
//! Everything here crosses the network: the intents a client sends, the
//! notifications the server sends back, and the identity types both
//! refer to.
//!
//! Both enums are internally tagged with camelCase names, so a frame
//! looks like `{"type": "markNumber", "roomKey": "R1", "number": 42}`.
//! That is the shape browser clients find easiest to switch on.

use std::fmt;

use bingo_card::{Card, Number};
use bingo_transport::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identity of a connected player.
///
/// One connection is one player, so the id is the connection id. It
/// serializes as a plain number (`#[serde(transparent)]`), which is what
/// `gameOver.winnerId` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl From<ConnectionId> for PlayerId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A caller-chosen room name, unique among live rooms.
///
/// Always built through [`RoomKey::parse`], which trims whitespace and
/// enforces the length limits, including when decoded. Intents carry the
/// raw string so a bad key is answered with a `roomError` instead of
/// failing the whole frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RoomKey(String);

impl RoomKey {
    /// Longest accepted key, in characters.
    pub const MAX_LEN: usize = 64;

    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(ProtocolError::InvalidRoomKey("room key must not be empty".into()));
        }
        if key.chars().count() > Self::MAX_LEN {
            return Err(ProtocolError::InvalidRoomKey(format!(
                "room key must be at most {} characters",
                Self::MAX_LEN
            )));
        }
        Ok(Self(key.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<RoomKey> for String {
    fn from(key: RoomKey) -> Self {
        key.0
    }
}

impl TryFrom<String> for RoomKey {
    type Error = ProtocolError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player's seat in a room: slot 1 created it, slot 2 joined it.
///
/// Serialized as the bare number (`1` or `2`), the `playerIndex` clients
/// display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlayerSlot {
    Creator,
    Joiner,
}

impl PlayerSlot {
    pub fn index(self) -> u8 {
        match self {
            Self::Creator => 1,
            Self::Joiner => 2,
        }
    }

    /// The name shown to players, e.g. "Player 2".
    pub fn display_name(self) -> String {
        format!("Player {}", self.index())
    }
}

impl From<PlayerSlot> for u8 {
    fn from(slot: PlayerSlot) -> Self {
        slot.index()
    }
}

impl TryFrom<u8> for PlayerSlot {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Creator),
            2 => Ok(Self::Joiner),
            other => Err(ProtocolError::InvalidSlot(other)),
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.index())
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a notification?
// ---------------------------------------------------------------------------

/// The target of a room notification.
///
/// Rooms address notifications by player rather than through any
/// transport-level broadcast group; the room actor resolves the target
/// against its own member list at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every member of the room.
    All,
    /// One member.
    Player(PlayerId),
    /// Every member except one (e.g. the player who just left).
    AllExcept(PlayerId),
}

impl Recipient {
    /// Whether `player` is covered by this target.
    pub fn includes(&self, player: PlayerId) -> bool {
        match *self {
            Self::All => true,
            Self::Player(p) => p == player,
            Self::AllExcept(p) => p != player,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientIntent: client → server
// ---------------------------------------------------------------------------

/// Everything a client may ask of the server.
///
/// The sender is never part of the payload: the gateway knows which
/// connection a frame arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientIntent {
    /// Open a new room under this key and take slot 1.
    CreateRoom { room_key: String },

    /// Take slot 2 in an existing room. Starts the game.
    JoinRoom { room_key: String },

    /// Mark a drawn number on the caller's card.
    MarkNumber { room_key: String, number: Number },

    /// Keep-alive. Answered with `heartbeatAck`.
    Heartbeat { client_time: u64 },

    /// The client is leaving. Handled exactly like a dropped connection.
    Disconnect {
        #[serde(default)]
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ServerNotification: server → client
// ---------------------------------------------------------------------------

/// Everything the server may tell a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerNotification {
    /// First frame on every connection.
    Welcome { player_id: PlayerId, version: u32 },

    /// To the creator: the room exists and is waiting for a second player.
    RoomCreated { room_key: RoomKey },

    /// To one player: their seat and their card.
    GameInfo { player_index: PlayerSlot, card: Card },

    /// To the room: the second player is in.
    PlayerJoined { message: String },

    /// To the room: drawing begins.
    GameStarted,

    /// To the room: a new number and everything drawn so far, in order.
    NumberDrawn { number: Number, drawn_numbers: Vec<Number> },

    /// To the marking player: their card after the mark.
    CardUpdated { card: Card },

    /// To the marking player: the mark was refused and nothing changed.
    InvalidMark { reason: String },

    /// To the room: someone completed a line.
    GameOver { winner_id: PlayerId, winner_name: String },

    /// To the room: every number was drawn and nobody won.
    GameFinished { winner: Option<PlayerId> },

    /// To the remaining player: the room is gone.
    RoomClosed { reason: String },

    /// To the requester: create/join/mark was refused at the room level.
    RoomError { reason: String },

    /// Reply to `heartbeat`.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// The frame could not be understood. `code` follows HTTP conventions.
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Envelope: the outbound frame
// ---------------------------------------------------------------------------

/// Wrapper around every server frame.
///
/// ```text
/// { "seq": 7, "timestamp": 35012, "payload": { "type": "numberDrawn", ... } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Per-connection counter, starting at 0 with `welcome`. Lets a client
    /// spot frames lost by the transport.
    pub seq: u64,

    /// Milliseconds since the connection was accepted.
    pub timestamp: u64,

    pub payload: T,
}

// =========================================================================
// Tests
// =========================================================================
