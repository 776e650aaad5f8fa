//! Sockets for the bingo server, hidden behind two traits.
//!
//! A [`Transport`] hands out [`Connection`]s. Everything above this crate
//! talks to a connection only in whole frames plus keepalive pings, so
//! the room code can be tested without a network.
//!
//! `websocket` (on by default) adds [`WebSocketTransport`], the one
//! browsers speak.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

use tokio::time::Instant;

/// Process-unique number given to each accepted socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One peer, read and written through a shared reference.
///
/// A handler polls `recv` in one `select!` branch while another branch
/// calls `send` or `ping`, so neither may wait on the other.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Writes one data frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Waits for the next data frame. `Ok(None)` means the peer hung up.
    ///
    /// Control traffic such as pongs is consumed here without being
    /// returned, but still counts towards [`last_seen`](Self::last_seen).
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Asks the peer to prove it is alive. The answer shows up only as a
    /// newer [`last_seen`](Self::last_seen).
    async fn ping(&self) -> Result<(), Self::Error>;

    /// When anything, data or control, last arrived from the peer. Starts
    /// at the moment the connection was accepted.
    fn last_seen(&self) -> Instant;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    /// In-memory connection: frames pushed into `inbox` come out of
    /// `recv`, an empty frame stands in for a pong.
    struct Loopback {
        inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
        sent: Mutex<Vec<Vec<u8>>>,
        pings: Mutex<u32>,
        seen: Mutex<Instant>,
    }

    impl Loopback {
        fn new() -> (Self, mpsc::UnboundedSender<Vec<u8>>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let conn = Self {
                inbox: tokio::sync::Mutex::new(rx),
                sent: Mutex::new(Vec::new()),
                pings: Mutex::new(0),
                seen: Mutex::new(Instant::now()),
            };
            (conn, tx)
        }
    }

    impl Connection for Loopback {
        type Error = TransportError;

        async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
            self.sent.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
            let mut inbox = self.inbox.lock().await;
            while let Some(frame) = inbox.recv().await {
                *self.seen.lock().unwrap() = Instant::now();
                if !frame.is_empty() {
                    return Ok(Some(frame));
                }
            }
            Ok(None)
        }

        async fn ping(&self) -> Result<(), Self::Error> {
            *self.pings.lock().unwrap() += 1;
            Ok(())
        }

        fn last_seen(&self) -> Instant {
            *self.seen.lock().unwrap()
        }

        async fn close(&self) -> Result<(), Self::Error> {
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            ConnectionId::new(1)
        }
    }

    /// Echoes frames back until the peer hangs up, pinging first.
    async fn echo<C: Connection>(conn: &C) -> Result<usize, C::Error> {
        conn.ping().await?;
        let mut echoed = 0;
        while let Some(frame) = conn.recv().await? {
            conn.send(&frame).await?;
            echoed += 1;
        }
        Ok(echoed)
    }

    #[test]
    fn test_connection_id_formats_with_prefix() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
        assert_eq!(id.into_inner(), 7);
        assert!(ConnectionId::new(1) < id);
    }

    #[tokio::test]
    async fn test_code_generic_over_connection_sees_only_data_frames() {
        let (conn, peer) = Loopback::new();
        peer.send(b"one".to_vec()).unwrap();
        peer.send(Vec::new()).unwrap();
        peer.send(b"two".to_vec()).unwrap();
        drop(peer);

        assert_eq!(echo(&conn).await.unwrap(), 2);
        assert_eq!(*conn.sent.lock().unwrap(), vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(*conn.pings.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_control_frames_refresh_last_seen() {
        let (conn, peer) = Loopback::new();
        let accepted = conn.last_seen();

        tokio::time::advance(Duration::from_secs(30)).await;
        peer.send(Vec::new()).unwrap();
        drop(peer);
        assert!(conn.recv().await.unwrap().is_none());

        assert_eq!(conn.last_seen() - accepted, Duration::from_secs(30));
    }
}
