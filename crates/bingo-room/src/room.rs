//! Room actor: one Tokio task per room, owning its game and draw timer.
//!
//! Everything that touches a room (joins, marks, draws, close) goes
//! through this task's `select!` loop, so the room never needs a lock and
//! a stopped scheduler cannot fire again.

use std::collections::HashMap;

use bingo_card::{Card, Number};
use bingo_draw::{DrawScheduler, DrawTick};
use bingo_protocol::{PlayerId, PlayerSlot, RoomKey, ServerNotification};
use tokio::sync::{mpsc, oneshot};

use crate::game::{BingoRoom, Outbox};
use crate::{BingoConfig, RoomError, RoomPhase};

/// Channel for delivering notifications to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerNotification>;

/// What a successful join hands back to the caller.
#[derive(Debug, Clone)]
pub struct Joined {
    pub slot: PlayerSlot,
    pub card: Card,
}

/// Commands sent to a room actor. Each carries a reply channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<Joined, RoomError>>,
    },

    Mark {
        player_id: PlayerId,
        number: Number,
        reply: oneshot::Sender<Result<Card, RoomError>>,
    },

    Info {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// Tell the remaining members why and stop. Replies with the members
    /// other than `leaving`, or `NotInRoom` (and keeps running) when
    /// `leaving` was never seated here.
    Close {
        leaving: Option<PlayerId>,
        reason: String,
        reply: oneshot::Sender<Result<Vec<PlayerId>, RoomError>>,
    },
}

/// A snapshot of a room's public state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_key: RoomKey,
    pub phase: RoomPhase,
    /// Seated players, creator first.
    pub players: Vec<PlayerId>,
    pub drawn_count: usize,
    pub winner: Option<PlayerId>,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_key: RoomKey,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_key(&self) -> &RoomKey {
        &self.room_key
    }

    /// Whether both handles talk to the same actor. A key reused after a
    /// close gets a new actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Sends a command built around a fresh reply channel and waits for
    /// the answer. A stopped actor shows up as `Unavailable`.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_key.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_key.clone()))
    }

    /// Takes slot 2. Starts the draws on success.
    pub async fn join(&self, player_id: PlayerId, sender: PlayerSender) -> Result<Joined, RoomError> {
        self.request(|reply| RoomCommand::Join {
            player_id,
            sender,
            reply,
        })
        .await?
    }

    /// Marks a drawn number on the player's card and returns the card.
    pub async fn mark(&self, player_id: PlayerId, number: Number) -> Result<Card, RoomError> {
        self.request(|reply| RoomCommand::Mark {
            player_id,
            number,
            reply,
        })
        .await?
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Closes the room and waits for the actor to acknowledge.
    pub async fn close(
        &self,
        leaving: Option<PlayerId>,
        reason: impl Into<String>,
    ) -> Result<Vec<PlayerId>, RoomError> {
        let reason = reason.into();
        self.request(|reply| RoomCommand::Close {
            leaving,
            reason,
            reply,
        })
        .await?
    }
}

/// The actor's state. Lives inside the spawned task.
struct RoomActor {
    room: BingoRoom,
    scheduler: DrawScheduler,
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let room_key = self.room.key().clone();
        tracing::info!(%room_key, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::debug!(%room_key, "all room handles dropped");
                        break;
                    };
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                tick = self.scheduler.wait_for_draw() => self.handle_tick(tick),
            }
        }

        self.scheduler.cancel();
        tracing::info!(
            %room_key,
            draws = self.scheduler.metrics().total_draws,
            late_ticks = self.scheduler.metrics().late_ticks,
            "room actor stopped"
        );
        // Dropping the receiver fails every command still queued, so their
        // callers see `Unavailable`.
    }

    /// Returns `true` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_id, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Mark {
                player_id,
                number,
                reply,
            } => {
                let result = self.handle_mark(player_id, number);
                let _ = reply.send(result);
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Close {
                leaving,
                reason,
                reply,
            } => {
                if let Some(player_id) = leaving.filter(|p| self.room.seat(*p).is_none()) {
                    let key = self.room.key().clone();
                    let _ = reply.send(Err(RoomError::NotInRoom(player_id, key)));
                    return false;
                }
                self.scheduler.cancel();
                let outbox = self.room.close(leaving, &reason);
                self.dispatch(outbox);
                let remaining = self
                    .room
                    .players()
                    .filter(|p| Some(*p) != leaving)
                    .collect();
                tracing::info!(
                    room_key = %self.room.key(),
                    leaving = ?leaving,
                    %reason,
                    "room closed"
                );
                let _ = reply.send(Ok(remaining));
                return true;
            }
        }
        false
    }

    fn handle_join(&mut self, player_id: PlayerId, sender: PlayerSender) -> Result<Joined, RoomError> {
        let (seat, outbox) = self.room.join(player_id, &mut rand::rng())?;
        self.senders.insert(player_id, sender);
        tracing::info!(
            room_key = %self.room.key(),
            %player_id,
            slot = %seat.slot,
            "player joined"
        );

        self.dispatch(outbox);

        if self.scheduler.start(self.room.range_max(), &mut rand::rng()) {
            tracing::info!(
                room_key = %self.room.key(),
                interval_ms = self.scheduler.interval().as_millis() as u64,
                "game started"
            );
        }

        Ok(Joined {
            slot: seat.slot,
            card: seat.card,
        })
    }

    fn handle_mark(&mut self, player_id: PlayerId, number: Number) -> Result<Card, RoomError> {
        let (card, outbox) = self.room.mark(player_id, number).inspect_err(|err| {
            tracing::debug!(
                room_key = %self.room.key(),
                %player_id,
                number,
                %err,
                "mark rejected"
            );
        })?;

        if let Some(winner) = self.room.winner() {
            self.scheduler.finish_by_win();
            tracing::info!(
                room_key = %self.room.key(),
                %winner,
                draws = self.room.drawn_numbers().len(),
                "game won"
            );
        }
        self.dispatch(outbox);
        Ok(card)
    }

    fn handle_tick(&mut self, tick: DrawTick) {
        let outbox = match tick {
            DrawTick::Drawn(draw) => self.room.record_draw(draw.number),
            DrawTick::Exhausted => {
                tracing::info!(room_key = %self.room.key(), "number pool exhausted, no winner");
                self.room.exhaust()
            }
        };
        self.dispatch(outbox);
    }

    /// Delivers each notification to its recipients among the members.
    fn dispatch(&self, outbox: Outbox) {
        for (recipient, notification) in outbox {
            for (player_id, sender) in &self.senders {
                if recipient.includes(*player_id) {
                    // A closed receiver means that player is disconnecting;
                    // the gateway will close the room.
                    let _ = sender.send(notification.clone());
                }
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_key: self.room.key().clone(),
            phase: self.room.phase(),
            players: self.room.players().collect(),
            drawn_count: self.room.drawn_numbers().len(),
            winner: self.room.winner(),
        }
    }
}

/// Spawns the actor for a freshly opened room.
///
/// `creator` is registered as the first member's outbound channel.
pub(crate) fn spawn_room(
    room: BingoRoom,
    creator: (PlayerId, PlayerSender),
    config: &BingoConfig,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);
    let room_key = room.key().clone();

    let actor = RoomActor {
        room,
        scheduler: DrawScheduler::new(config.draw.clone()),
        senders: HashMap::from([creator]),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_key,
        sender: tx,
    }
}

#[cfg(test)]
mod tests {
    use bingo_protocol::Recipient;

    use super::*;

    #[test]
    fn test_dispatch_respects_recipients() {
        let (a_tx, mut a_rx) = mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = mpsc::unbounded_channel();
        let (_cmd_tx, cmd_rx) = mpsc::channel(1);
        let (room, _) = BingoRoom::open(
            RoomKey::parse("R").unwrap(),
            bingo_card::CardSpec::default(),
            PlayerId(1),
            &mut rand::rng(),
        );
        let actor = RoomActor {
            room,
            scheduler: DrawScheduler::new(Default::default()),
            senders: HashMap::from([(PlayerId(1), a_tx), (PlayerId(2), b_tx)]),
            receiver: cmd_rx,
        };

        actor.dispatch(vec![
            (Recipient::Player(PlayerId(2)), ServerNotification::GameStarted),
            (
                Recipient::AllExcept(PlayerId(2)),
                ServerNotification::RoomClosed { reason: "x".into() },
            ),
        ]);

        assert_eq!(b_rx.try_recv().unwrap(), ServerNotification::GameStarted);
        assert!(b_rx.try_recv().is_err());
        assert!(matches!(
            a_rx.try_recv().unwrap(),
            ServerNotification::RoomClosed { .. }
        ));
        assert!(a_rx.try_recv().is_err());
    }
}
