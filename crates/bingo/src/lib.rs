//! # Bingo
//!
//! A real-time, two-player bingo server over WebSocket.
//!
//! A player creates a room under a key of their choosing and receives a
//! card. A second player joins with the same key and receives theirs.
//! From then on the room draws a number every few seconds; players mark
//! drawn numbers on their own card and the first completed row, column or
//! diagonal wins. If either player leaves, the room is destroyed.
//!
//! ```text
//! WebSocketTransport → handler (per connection) → Gateway → RoomRegistry
//!                                                              │
//!                                             room actor + DrawScheduler
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingo::prelude::*;
//!
//! # async fn start() -> Result<(), BingoError> {
//! let server = BingoServer::builder().bind("0.0.0.0:3000").build().await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

mod error;
mod gateway;
mod handler;
mod server;

pub use error::BingoError;
pub use gateway::{Gateway, rejection};
pub use server::{BingoServer, BingoServerBuilder, SHUTDOWN_REASON, ServerConfig};

/// Convenient re-exports for running and embedding a server.
pub mod prelude {
    pub use crate::{BingoError, BingoServer, BingoServerBuilder, Gateway, ServerConfig};
    pub use bingo_card::{Card, CardSpec};
    pub use bingo_draw::DrawConfig;
    pub use bingo_protocol::{ClientIntent, PlayerId, RoomKey, ServerNotification};
    pub use bingo_room::{BingoConfig, RoomRegistry};
}
