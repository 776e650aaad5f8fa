//! Integration tests for the draw scheduler.
//!
//! Every async test runs with paused time, so `sleep_until` resolves as
//! soon as the runtime has nothing else to do and intervals cost nothing.

use std::time::Duration;

use bingo_draw::{DrawConfig, DrawScheduler, DrawState, DrawTick};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

const INTERVAL: Duration = Duration::from_millis(100);

fn scheduler() -> DrawScheduler {
    DrawScheduler::new(DrawConfig::with_interval(INTERVAL))
}

async fn next_number(s: &mut DrawScheduler) -> u32 {
    match s.wait_for_draw().await {
        DrawTick::Drawn(draw) => draw.number,
        DrawTick::Exhausted => panic!("expected a number, got exhaustion"),
    }
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn test_new_scheduler_is_idle() {
    let s = scheduler();
    assert_eq!(s.state(), DrawState::Idle);
    assert_eq!(s.drawn_count(), 0);
    assert_eq!(s.remaining(), 0);
    assert_eq!(s.interval(), INTERVAL);
}

#[test]
fn test_start_only_once() {
    let mut s = scheduler();
    let mut rng = StdRng::seed_from_u64(1);
    assert!(s.start(75, &mut rng));
    assert!(!s.start(75, &mut rng), "second start must be refused");
    assert!(!s.start_with_order(vec![1, 2, 3]));
    assert_eq!(s.remaining(), 75);
}

#[test]
fn test_cancel_before_start_prevents_start() {
    let mut s = scheduler();
    s.cancel();
    assert_eq!(s.state(), DrawState::Canceled);
    assert!(!s.start_with_order(vec![1, 2, 3]));
}

#[test]
fn test_finish_by_win_only_applies_while_running() {
    let mut s = scheduler();
    s.finish_by_win();
    assert_eq!(s.state(), DrawState::Idle);

    s.start_with_order(vec![1, 2]);
    s.finish_by_win();
    assert_eq!(s.state(), DrawState::FinishedByWin);

    // Cancel after a win keeps the win.
    s.cancel();
    assert_eq!(s.state(), DrawState::FinishedByWin);
}

// =========================================================================
// Drawing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_draws_follow_order_then_exhaust() {
    let mut s = scheduler();
    s.start_with_order(vec![42, 7, 13]);

    assert_eq!(next_number(&mut s).await, 42);
    assert_eq!(next_number(&mut s).await, 7);
    assert_eq!(next_number(&mut s).await, 13);
    assert_eq!(s.remaining(), 0);
    assert_eq!(s.state(), DrawState::Running);

    assert_eq!(s.wait_for_draw().await, DrawTick::Exhausted);
    assert_eq!(s.state(), DrawState::FinishedByExhaustion);
    assert_eq!(s.drawn_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_full_run_is_a_permutation() {
    let mut s = scheduler();
    let mut rng = StdRng::seed_from_u64(99);
    s.start(75, &mut rng);

    let mut seen = Vec::new();
    loop {
        match s.wait_for_draw().await {
            DrawTick::Drawn(draw) => {
                assert_eq!(draw.seq, seen.len() + 1);
                seen.push(draw.number);
            }
            DrawTick::Exhausted => break,
        }
    }

    seen.sort_unstable();
    assert_eq!(seen, (1..=75).collect::<Vec<_>>());
    assert_eq!(s.metrics().total_draws, 75);
}

#[tokio::test(start_paused = true)]
async fn test_draws_are_one_interval_apart() {
    let mut s = scheduler();
    let started = Instant::now();
    s.start_with_order(vec![1, 2, 3]);

    next_number(&mut s).await;
    assert_eq!(started.elapsed(), INTERVAL);
    next_number(&mut s).await;
    assert_eq!(started.elapsed(), INTERVAL * 2);
    next_number(&mut s).await;
    assert_eq!(started.elapsed(), INTERVAL * 3);

    // Exhaustion is reported one interval after the last draw.
    s.wait_for_draw().await;
    assert_eq!(started.elapsed(), INTERVAL * 4);
}

#[tokio::test(start_paused = true)]
async fn test_idle_scheduler_never_fires() {
    let mut s = scheduler();
    let result = tokio::time::timeout(Duration::from_secs(60), s.wait_for_draw()).await;
    assert!(result.is_err(), "idle scheduler must pend");
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_draws() {
    let mut s = scheduler();
    s.start_with_order(vec![1, 2, 3]);
    next_number(&mut s).await;

    s.cancel();
    assert_eq!(s.state(), DrawState::Canceled);
    let result = tokio::time::timeout(INTERVAL * 10, s.wait_for_draw()).await;
    assert!(result.is_err(), "canceled scheduler must not draw");
    assert_eq!(s.drawn_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_win_stops_draws() {
    let mut s = scheduler();
    s.start_with_order(vec![5, 6, 7]);
    next_number(&mut s).await;

    s.finish_by_win();
    let result = tokio::time::timeout(INTERVAL * 10, s.wait_for_draw()).await;
    assert!(result.is_err());
    assert_eq!(s.remaining(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_is_counted_and_does_not_burst() {
    let mut s = scheduler();
    s.start_with_order(vec![1, 2, 3]);

    // Nobody polls the scheduler for three intervals.
    tokio::time::advance(INTERVAL * 3).await;
    let before = Instant::now();

    match s.wait_for_draw().await {
        DrawTick::Drawn(draw) => assert!(draw.late),
        DrawTick::Exhausted => panic!("expected a draw"),
    }
    assert_eq!(s.metrics().late_ticks, 1);
    assert!(s.metrics().max_lateness >= INTERVAL * 2);

    // The next draw is a full interval later, not immediate.
    next_number(&mut s).await;
    assert_eq!(before.elapsed(), INTERVAL);
}

// =========================================================================
// select! integration
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_with_commands() {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&'static str>(8);
    let mut s = scheduler();
    s.start_with_order(vec![10, 20, 30, 40]);

    tokio::spawn(async move {
        tokio::time::sleep(INTERVAL * 2 + INTERVAL / 2).await;
        let _ = tx.send("stop").await;
    });

    let mut drawn = Vec::new();
    loop {
        tokio::select! {
            cmd = rx.recv() => {
                if cmd == Some("stop") {
                    s.cancel();
                    break;
                }
            }
            tick = s.wait_for_draw() => {
                if let DrawTick::Drawn(draw) = tick {
                    drawn.push(draw.number);
                }
            }
        }
    }

    assert_eq!(drawn, vec![10, 20]);
    assert_eq!(s.state(), DrawState::Canceled);
}
