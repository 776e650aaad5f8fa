//! The bingo game state of one room.
//!
//! [`BingoRoom`] is plain data with synchronous operations. It knows
//! nothing about tasks, timers or sockets. Each operation validates,
//! mutates, and returns the notifications the change produced, addressed
//! with a [`Recipient`]; the room actor delivers them.

use std::collections::HashSet;

use bingo_card::{Card, CardSpec, Number, has_won};
use bingo_protocol::{PlayerId, PlayerSlot, Recipient, RoomKey, ServerNotification};
use rand::Rng;

use crate::{RoomError, RoomPhase};

/// Notifications produced by one operation, in delivery order.
pub type Outbox = Vec<(Recipient, ServerNotification)>;

/// Text sent to the remaining player when the other one leaves.
pub const PLAYER_LEFT_REASON: &str = "The other player left the game.";

/// A seated player.
#[derive(Debug, Clone)]
pub struct Seat {
    pub player_id: PlayerId,
    pub slot: PlayerSlot,
    pub card: Card,
}

/// One room's game: two seats, the drawn numbers, and the outcome.
#[derive(Debug)]
pub struct BingoRoom {
    key: RoomKey,
    spec: CardSpec,
    phase: RoomPhase,
    /// Creator first, joiner second.
    seats: Vec<Seat>,
    /// Same elements as `drawn_order`, for O(1) lookups.
    drawn: HashSet<Number>,
    drawn_order: Vec<Number>,
    winner: Option<PlayerId>,
}

impl BingoRoom {
    /// Opens a room with the creator in slot 1.
    ///
    /// The returned outbox holds the creator's `roomCreated` and
    /// `gameInfo`.
    pub fn open<R: Rng + ?Sized>(
        key: RoomKey,
        spec: CardSpec,
        creator: PlayerId,
        rng: &mut R,
    ) -> (Self, Outbox) {
        let card = spec.generate(rng);
        let outbox = vec![
            (
                Recipient::Player(creator),
                ServerNotification::RoomCreated {
                    room_key: key.clone(),
                },
            ),
            (
                Recipient::Player(creator),
                ServerNotification::GameInfo {
                    player_index: PlayerSlot::Creator,
                    card: card.clone(),
                },
            ),
        ];

        let room = Self {
            key,
            spec,
            phase: RoomPhase::WaitingForPlayer,
            seats: vec![Seat {
                player_id: creator,
                slot: PlayerSlot::Creator,
                card,
            }],
            drawn: HashSet::with_capacity(spec.range_max() as usize),
            drawn_order: Vec::with_capacity(spec.range_max() as usize),
            winner: None,
        };
        (room, outbox)
    }

    /// Seats `player` in slot 2 and moves the room to `Running`.
    ///
    /// The caller starts the draw scheduler when this succeeds; a join is
    /// the only thing that starts a game.
    pub fn join<R: Rng + ?Sized>(
        &mut self,
        player: PlayerId,
        rng: &mut R,
    ) -> Result<(Seat, Outbox), RoomError> {
        if self.seat(player).is_some() {
            return Err(RoomError::AlreadyInRoom(player, self.key.clone()));
        }
        if !self.phase.is_joinable() || self.seats.len() >= 2 {
            return Err(RoomError::RoomFull(self.key.clone()));
        }

        let seat = Seat {
            player_id: player,
            slot: PlayerSlot::Joiner,
            card: self.spec.generate(rng),
        };
        self.seats.push(seat.clone());
        self.phase = RoomPhase::Running;

        let outbox = vec![
            (
                Recipient::Player(player),
                ServerNotification::GameInfo {
                    player_index: seat.slot,
                    card: seat.card.clone(),
                },
            ),
            (
                Recipient::All,
                ServerNotification::PlayerJoined {
                    message: format!("{} joined!", seat.slot.display_name()),
                },
            ),
            (Recipient::All, ServerNotification::GameStarted),
        ];
        Ok((seat, outbox))
    }

    /// Marks `number` on `player`'s card.
    ///
    /// Checks run in a fixed order: membership, game over, range, drawn.
    /// A drawn number that is not on the card (or already marked) still
    /// answers with `cardUpdated`. A completed line makes `player` the
    /// winner and broadcasts `gameOver`.
    pub fn mark(&mut self, player: PlayerId, number: Number) -> Result<(Card, Outbox), RoomError> {
        let key = self.key.clone();
        let range_max = self.spec.range_max();
        let game_over = self.is_over();
        let drawn = self.drawn.contains(&number);

        let seat = self
            .seats
            .iter_mut()
            .find(|s| s.player_id == player)
            .ok_or(RoomError::NotInRoom(player, key))?;
        if game_over {
            return Err(RoomError::GameOver);
        }
        if !(1..=range_max).contains(&number) {
            return Err(RoomError::NumberOutOfRange { number, range_max });
        }
        if !drawn {
            return Err(RoomError::NumberNotYetDrawn(number));
        }

        seat.card.mark(number);
        let card = seat.card.clone();
        let slot = seat.slot;

        let mut outbox = vec![(
            Recipient::Player(player),
            ServerNotification::CardUpdated { card: card.clone() },
        )];

        if has_won(&card) {
            self.winner = Some(player);
            self.phase = RoomPhase::Finished;
            outbox.push((
                Recipient::All,
                ServerNotification::GameOver {
                    winner_id: player,
                    winner_name: slot.display_name(),
                },
            ));
        }
        Ok((card, outbox))
    }

    /// Records a drawn number and announces it.
    ///
    /// Ignored once the game is over or the number was already drawn, so
    /// the drawn set and sequence stay identical.
    pub fn record_draw(&mut self, number: Number) -> Outbox {
        if !self.phase.is_running() || !self.drawn.insert(number) {
            return Vec::new();
        }
        self.drawn_order.push(number);
        vec![(
            Recipient::All,
            ServerNotification::NumberDrawn {
                number,
                drawn_numbers: self.drawn_order.clone(),
            },
        )]
    }

    /// Ends a running game with no winner.
    pub fn exhaust(&mut self) -> Outbox {
        if !self.phase.is_running() {
            return Vec::new();
        }
        self.phase = RoomPhase::Finished;
        vec![(
            Recipient::All,
            ServerNotification::GameFinished { winner: None },
        )]
    }

    /// Closes the room. Everyone except `leaving` is told why.
    pub fn close(&mut self, leaving: Option<PlayerId>, reason: &str) -> Outbox {
        if self.phase == RoomPhase::Closed {
            return Vec::new();
        }
        self.phase = RoomPhase::Closed;
        let recipient = match leaving {
            Some(player) => Recipient::AllExcept(player),
            None => Recipient::All,
        };
        vec![(
            recipient,
            ServerNotification::RoomClosed {
                reason: reason.to_owned(),
            },
        )]
    }

    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Finished by a win or by exhaustion, or closed.
    pub fn is_over(&self) -> bool {
        matches!(self.phase, RoomPhase::Finished | RoomPhase::Closed)
    }

    /// Slot 1. A room is never without its creator.
    pub fn creator(&self) -> &Seat {
        &self.seats[0]
    }

    pub fn seat(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player_id == player)
    }

    /// Seated players, creator first.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.seats.iter().map(|s| s.player_id)
    }

    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    /// Drawn numbers in draw order.
    pub fn drawn_numbers(&self) -> &[Number] {
        &self.drawn_order
    }

    pub fn is_drawn(&self, number: Number) -> bool {
        self.drawn.contains(&number)
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn range_max(&self) -> Number {
        self.spec.range_max()
    }
}
