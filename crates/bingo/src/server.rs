//! `BingoServer` builder and accept loop.
//!
//! This is the entry point for running a bingo server. It ties together
//! all the layers: transport → protocol → gateway → rooms.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bingo_protocol::{Codec, JsonCodec};
use bingo_room::{BingoConfig, RoomRegistry};
use bingo_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{BingoError, Gateway};

/// Reason sent in `roomClosed` when the server stops.
pub const SHUTDOWN_REASON: &str = "server shutting down";

/// Connection-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: String,

    /// A connection from which nothing arrives for this long is closed.
    /// The server pings every third of this, and a pong counts, so only
    /// clients that have really gone away hit it.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) gateway: Gateway,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a bingo server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use bingo::prelude::*;
///
/// # async fn start() -> Result<(), BingoError> {
/// let server = BingoServer::builder()
///     .bind("0.0.0.0:3000")
///     .draw_interval(Duration::from_secs(5))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BingoServerBuilder {
    server: ServerConfig,
    game: BingoConfig,
}

impl BingoServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind to. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.server.bind_addr = addr.to_string();
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.server.idle_timeout = timeout;
        self
    }

    /// Replaces the game settings (number range, draw timing, queue size).
    pub fn config(mut self, config: BingoConfig) -> Self {
        self.game = config;
        self
    }

    /// Sets only the time between draws.
    pub fn draw_interval(mut self, interval: Duration) -> Self {
        self.game.draw.interval = interval;
        self
    }

    /// Validates the game settings and binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`, which is what browser
    /// clients speak.
    pub async fn build(self) -> Result<BingoServer<JsonCodec>, BingoError> {
        let rooms = Arc::new(RoomRegistry::new(self.game)?);
        let transport = WebSocketTransport::bind(&self.server.bind_addr).await?;

        let state = Arc::new(ServerState {
            gateway: Gateway::new(rooms),
            codec: JsonCodec,
            config: self.server,
        });

        Ok(BingoServer { transport, state })
    }
}

/// A bound bingo server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct BingoServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl BingoServer<JsonCodec> {
    pub fn builder() -> BingoServerBuilder {
        BingoServerBuilder::new()
    }
}

impl<C: Codec> BingoServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn gateway(&self) -> &Gateway {
        &self.state.gateway
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), BingoError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then closes every
    /// room so their members hear why.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), BingoError> {
        tracing::info!(
            addr = ?self.transport.local_addr().ok(),
            idle_timeout_secs = self.state.config.idle_timeout.as_secs(),
            "bingo server running"
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        let rooms = self.state.gateway.rooms();
        let open_rooms = rooms.room_count().await;
        tracing::info!(rooms = open_rooms, "shutting down");
        rooms.close_all(SHUTDOWN_REASON).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_setters() {
        let builder = BingoServerBuilder::new()
            .bind("0.0.0.0:0")
            .idle_timeout(Duration::from_secs(5))
            .draw_interval(Duration::from_millis(250));

        assert_eq!(builder.server.bind_addr, "0.0.0.0:0");
        assert_eq!(builder.server.idle_timeout, Duration::from_secs(5));
        assert_eq!(builder.game.draw.interval, Duration::from_millis(250));
        assert_eq!(builder.game.range_max, 75);
    }

    #[tokio::test]
    async fn test_build_rejects_bad_game_config() {
        let result = BingoServerBuilder::new()
            .bind("127.0.0.1:0")
            .config(BingoConfig {
                range_max: 10,
                ..BingoConfig::default()
            })
            .build()
            .await;

        assert!(matches!(result, Err(BingoError::Config(_))));
    }
}
