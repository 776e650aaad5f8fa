//! Wire protocol for the bingo server.
//!
//! - **Types** ([`ClientIntent`], [`ServerNotification`], [`Envelope`],
//!   [`PlayerId`], [`RoomKey`], [`PlayerSlot`], [`Recipient`]): what
//!   travels between browser and server.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how those become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (intents / notifications) → Gateway → Rooms
//! ```
//!
//! Cards travel as [`bingo_card::Card`], re-exported here so clients of
//! this crate need only one import.

mod codec;
mod error;
mod types;

pub use bingo_card::{Card, Cell, Number};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientIntent, Envelope, PlayerId, PlayerSlot, Recipient, RoomKey, ServerNotification,
};

/// Protocol version announced in `welcome`. Bumped on any breaking change
/// to the shapes in this crate.
pub const PROTOCOL_VERSION: u32 = 1;
