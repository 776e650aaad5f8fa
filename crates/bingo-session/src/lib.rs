//! Player sessions for the bingo server.
//!
//! A session exists for every live connection. It records who the player
//! is and which room, if any, they currently sit in. The gateway consults
//! it to enforce one room per connection and to find the room to clean up
//! when a socket goes away.
//!
//! ```text
//! Gateway (above)  ← binds / unbinds rooms, removes on disconnect
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)  ← PlayerId, RoomKey, PlayerSlot
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionState};
