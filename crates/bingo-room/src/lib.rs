//! Bingo rooms.
//!
//! Each room runs as its own Tokio task (actor model) holding the game
//! state and the draw timer. The registry maps room keys to those tasks.
//!
//! # Key types
//!
//! - [`BingoRoom`]: one room's game rules, free of any async machinery
//! - [`RoomRegistry`]: creates, looks up and destroys rooms
//! - [`RoomHandle`]: sends commands to a running room actor
//! - [`RoomPhase`]: lifecycle state machine
//! - [`BingoConfig`]: number range, draw cadence, channel sizing

mod config;
mod error;
mod game;
mod registry;
mod room;

pub use config::{BingoConfig, RoomPhase};
pub use error::{ConfigError, RoomError};
pub use game::{BingoRoom, Outbox, PLAYER_LEFT_REASON, Seat};
pub use registry::RoomRegistry;
pub use room::{Joined, PlayerSender, RoomHandle, RoomInfo};
