//! Per-connection handler: intents in, notifications out.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register with the gateway, which queues `welcome`
//!   2. Loop over frames from the client, notifications from the gateway
//!      and rooms, the keepalive ping and the idle deadline
//!   3. On any exit, disconnect the player from the gateway

use std::sync::Arc;
use std::time::Duration;

use bingo_protocol::{ClientIntent, Codec, Envelope, PlayerId, ServerNotification};
use bingo_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::server::ServerState;
use crate::BingoError;

/// Disconnects the player when the handler exits.
///
/// The normal path calls [`finish`](Self::finish) and awaits the cleanup.
/// If the task unwinds instead, `Drop` spawns the same cleanup since it
/// cannot await.
struct DisconnectGuard<C: Codec> {
    player_id: PlayerId,
    state: Option<Arc<ServerState<C>>>,
}

impl<C: Codec> DisconnectGuard<C> {
    fn new(player_id: PlayerId, state: Arc<ServerState<C>>) -> Self {
        Self {
            player_id,
            state: Some(state),
        }
    }

    async fn finish(mut self) {
        if let Some(state) = self.state.take() {
            disconnect(&state, self.player_id).await;
        }
    }
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            let player_id = self.player_id;
            tokio::spawn(async move { disconnect(&state, player_id).await });
        }
    }
}

async fn disconnect<C: Codec>(state: &ServerState<C>, player_id: PlayerId) {
    if let Err(e) = state.gateway.disconnect(player_id).await {
        tracing::warn!(%player_id, error = %e, "disconnect cleanup failed");
    }
}

/// Numbers and timestamps outbound frames for one connection.
struct Outgoing {
    seq: u64,
    start: Instant,
}

impl Outgoing {
    fn new() -> Self {
        Self {
            seq: 0,
            start: Instant::now(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn wrap(&mut self, payload: ServerNotification) -> Envelope<ServerNotification> {
        Envelope {
            seq: next_seq(&mut self.seq),
            timestamp: self.elapsed_ms(),
            payload,
        }
    }
}

/// Returns the current value and advances the counter.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq = seq.wrapping_add(1);
    current
}

/// How often to ping a peer that must answer within `idle_timeout`.
fn keepalive_period(idle_timeout: Duration) -> Duration {
    (idle_timeout / 3).max(Duration::from_millis(10))
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), BingoError> {
    let player_id = PlayerId::from(conn.id());
    let mut outbound = state.gateway.connect(player_id).await?;
    let guard = DisconnectGuard::new(player_id, Arc::clone(&state));
    tracing::info!(%player_id, "player connected");

    let result = serve(&conn, &state, player_id, &mut outbound).await;

    guard.finish().await;
    if let Err(e) = conn.close().await {
        tracing::debug!(%player_id, error = %e, "close after session end failed");
    }
    result
}

/// The message loop. Returns when the client leaves, stops answering or
/// can no longer be written to.
///
/// Idleness is judged by [`Connection::last_seen`], so a client that only
/// answers pings while it waits for an opponent stays connected.
async fn serve<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    player_id: PlayerId,
    outbound: &mut mpsc::UnboundedReceiver<ServerNotification>,
) -> Result<(), BingoError> {
    let idle_timeout = state.config.idle_timeout;
    let mut out = Outgoing::new();
    let mut deadline = Instant::now() + idle_timeout;
    let period = keepalive_period(idle_timeout);
    let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            incoming = conn.recv() => {
                let data = match incoming {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };

                let intent: ClientIntent = match state.codec.decode(&data) {
                    Ok(intent) => intent,
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "failed to decode intent");
                        let error = ServerNotification::Error {
                            code: 400,
                            message: e.to_string(),
                        };
                        send_frame(conn, &state.codec, out.wrap(error)).await?;
                        continue;
                    }
                };

                match intent {
                    ClientIntent::Heartbeat { client_time } => {
                        let ack = ServerNotification::HeartbeatAck {
                            client_time,
                            server_time: out.elapsed_ms(),
                        };
                        send_frame(conn, &state.codec, out.wrap(ack)).await?;
                    }
                    ClientIntent::Disconnect { reason } => {
                        tracing::info!(%player_id, %reason, "client disconnected");
                        break;
                    }
                    intent => state.gateway.handle_intent(player_id, intent).await?,
                }
            }

            Some(notification) = outbound.recv() => {
                send_frame(conn, &state.codec, out.wrap(notification)).await?;
            }

            _ = keepalive.tick() => conn.ping().await?,

            _ = tokio::time::sleep_until(deadline) => {
                let refreshed = conn.last_seen() + idle_timeout;
                if refreshed > Instant::now() {
                    deadline = refreshed;
                    continue;
                }
                tracing::info!(
                    %player_id,
                    idle_secs = idle_timeout.as_secs(),
                    "connection idle, closing"
                );
                break;
            }
        }
    }

    Ok(())
}

async fn send_frame<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    envelope: Envelope<ServerNotification>,
) -> Result<(), BingoError> {
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_seq_starts_at_zero_and_advances() {
        let mut seq = 0;
        assert_eq!(next_seq(&mut seq), 0);
        assert_eq!(next_seq(&mut seq), 1);
        assert_eq!(seq, 2);
    }

    #[test]
    fn test_next_seq_wraps() {
        let mut seq = u64::MAX;
        assert_eq!(next_seq(&mut seq), u64::MAX);
        assert_eq!(seq, 0);
    }

    #[test]
    fn test_keepalive_pings_three_times_per_timeout() {
        assert_eq!(keepalive_period(Duration::from_secs(60)), Duration::from_secs(20));
        assert_eq!(keepalive_period(Duration::ZERO), Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_outgoing_numbers_frames_in_order() {
        let mut out = Outgoing::new();
        let first = out.wrap(ServerNotification::GameStarted);
        tokio::time::advance(Duration::from_millis(250)).await;
        let second = out.wrap(ServerNotification::GameStarted);

        assert_eq!((first.seq, first.timestamp), (0, 0));
        assert_eq!((second.seq, second.timestamp), (1, 250));
    }
}
