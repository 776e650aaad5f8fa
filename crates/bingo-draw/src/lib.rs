//! Number draw scheduler for bingo rooms.
//!
//! One [`DrawScheduler`] per room. When the second player joins, the room
//! calls [`DrawScheduler::start`], which fixes the whole draw order up
//! front (a shuffled `1..=range_max`). After that,
//! [`DrawScheduler::wait_for_draw`] resolves once per interval with the
//! next number, and once more with [`DrawTick::Exhausted`] when the order
//! runs out.
//!
//! # State machine
//!
//! ```text
//! Idle ──start──→ Running ──(order used up)──→ FinishedByExhaustion
//!                    │
//!                    ├──finish_by_win──→ FinishedByWin
//!                    └──cancel─────────→ Canceled
//! ```
//!
//! In every state except `Running`, `wait_for_draw` pends forever.
//!
//! # Integration
//!
//! The scheduler sits inside a room actor's `tokio::select!` loop, next to
//! the command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = commands.recv() => { /* join / mark / close */ }
//!         tick = scheduler.wait_for_draw() => { /* record + broadcast */ }
//!     }
//! }
//! ```
//!
//! Ticks and commands are handled by the same task, one at a time. Once a
//! command handler calls `finish_by_win` or `cancel`, the next loop
//! iteration polls a future that never resolves, so no tick can fire
//! after the event that stopped the scheduler.
//!
//! `wait_for_draw` only mutates state after its sleep completes and never
//! awaits after that, so dropping it when another `select!` branch wins
//! loses nothing.

use std::time::Duration;

use bingo_card::{Number, shuffled_range};
use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing for a room's draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawConfig {
    /// Time between draws.
    pub interval: Duration,
    /// Upper bound of a random delay added to the *first* draw only, so
    /// rooms started in the same instant do not all tick together.
    pub initial_jitter: Duration,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            initial_jitter: Duration::ZERO,
        }
    }
}

impl DrawConfig {
    /// Shortest accepted interval.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`DrawScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "draw interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

/// Uniform delay in `0..=max`, sampled at nanosecond resolution so any
/// non-zero bound is a valid range.
fn sample_jitter<R: Rng + ?Sized>(max: Duration, rng: &mut R) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    let max_ns = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    Duration::from_nanos(rng.random_range(0..=max_ns))
}

// ---------------------------------------------------------------------------
// State and tick results
// ---------------------------------------------------------------------------

/// Where a scheduler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    Idle,
    Running,
    FinishedByExhaustion,
    FinishedByWin,
    Canceled,
}

impl DrawState {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// `true` for the three end states. Terminal schedulers never restart.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::FinishedByExhaustion | Self::FinishedByWin | Self::Canceled
        )
    }
}

impl std::fmt::Display for DrawState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::FinishedByExhaustion => "FinishedByExhaustion",
            Self::FinishedByWin => "FinishedByWin",
            Self::Canceled => "Canceled",
        };
        f.write_str(name)
    }
}

/// A number coming off the draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub number: Number,
    /// 1-based position in the draw order.
    pub seq: usize,
    /// The tick woke more than 10% of an interval late.
    pub late: bool,
}

/// What one resolution of [`DrawScheduler::wait_for_draw`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTick {
    Drawn(Draw),
    /// Every number has been drawn. The scheduler is now
    /// `FinishedByExhaustion`; this is reported exactly once.
    Exhausted,
}

/// Counters for one scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawMetrics {
    pub total_draws: u64,
    pub late_ticks: u64,
    pub max_lateness: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Emits a room's numbers at a fixed cadence.
pub struct DrawScheduler {
    config: DrawConfig,
    state: DrawState,
    order: Vec<Number>,
    cursor: usize,
    next_tick: Option<Instant>,
    metrics: DrawMetrics,
}

impl DrawScheduler {
    /// Creates an idle scheduler.
    pub fn new(config: DrawConfig) -> Self {
        Self {
            config: config.validated(),
            state: DrawState::Idle,
            order: Vec::new(),
            cursor: 0,
            next_tick: None,
            metrics: DrawMetrics::default(),
        }
    }

    /// Starts drawing a fresh shuffle of `1..=range_max`.
    ///
    /// Only the first call does anything; a scheduler is started at most
    /// once. Returns whether this call started it.
    pub fn start<R: Rng + ?Sized>(&mut self, range_max: Number, rng: &mut R) -> bool {
        if self.state != DrawState::Idle {
            debug!(state = %self.state, "draw scheduler already started");
            return false;
        }
        let order = shuffled_range(range_max, rng);
        self.start_with_order(order)
    }

    /// Starts drawing a caller-supplied order.
    ///
    /// For seeded replays and tests; the order is taken as is.
    pub fn start_with_order(&mut self, order: Vec<Number>) -> bool {
        if self.state != DrawState::Idle {
            debug!(state = %self.state, "draw scheduler already started");
            return false;
        }

        let jitter = sample_jitter(self.config.initial_jitter, &mut rand::rng());

        self.order = order;
        self.cursor = 0;
        self.state = DrawState::Running;
        self.next_tick = Some(Instant::now() + self.config.interval + jitter);

        debug!(
            numbers = self.order.len(),
            interval_ms = self.config.interval.as_millis() as u64,
            "draw scheduler started"
        );
        true
    }

    /// Waits for the next tick and returns what it produced.
    ///
    /// Pends forever unless the scheduler is `Running`.
    pub async fn wait_for_draw(&mut self) -> DrawTick {
        let next = match self.next_tick {
            Some(next) if self.state.is_running() => next,
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        let interval = self.config.interval;
        let late_by = now.saturating_duration_since(next);
        let late = late_by > interval / 10;
        if late {
            self.metrics.late_ticks += 1;
            warn!(
                draw = self.cursor + 1,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "draw tick fired late"
            );
        }
        self.metrics.max_lateness = self.metrics.max_lateness.max(late_by);

        let Some(&number) = self.order.get(self.cursor) else {
            self.state = DrawState::FinishedByExhaustion;
            self.next_tick = None;
            debug!(draws = self.cursor, "draw order exhausted");
            return DrawTick::Exhausted;
        };

        self.cursor += 1;
        self.metrics.total_draws += 1;
        // Schedule from now so a late tick does not cause a burst.
        self.next_tick = Some(now + interval);
        trace!(number, seq = self.cursor, "number drawn");

        DrawTick::Drawn(Draw {
            number,
            seq: self.cursor,
            late,
        })
    }

    /// Stops drawing because someone won. Idempotent.
    pub fn finish_by_win(&mut self) {
        if self.state.is_running() {
            self.state = DrawState::FinishedByWin;
            self.next_tick = None;
            debug!(draws = self.cursor, "draw scheduler stopped by win");
        }
    }

    /// Stops drawing because the room is going away. Idempotent, and a
    /// no-op once the scheduler has already finished.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = DrawState::Canceled;
            self.next_tick = None;
            debug!(draws = self.cursor, "draw scheduler canceled");
        }
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    /// How many numbers have been emitted.
    pub fn drawn_count(&self) -> usize {
        self.cursor
    }

    /// How many numbers are left in the order.
    pub fn remaining(&self) -> usize {
        self.order.len() - self.cursor
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn metrics(&self) -> &DrawMetrics {
        &self.metrics
    }
}
