use std::time::{Duration, Instant};
use tracing::warn;

/// Held back when deciding whether the A* fallback may run.
const SAFETY_MARGIN_MS: u64 = 1;

/// Carried-over compute-time budget (token bucket).
///
/// Starts with an initial allotment, gains a fixed increment at the start of
/// every turn and is drained by the wall-clock time the turn actually took.
/// The expensive A* fallback only runs while enough budget remains.
#[derive(Clone, Debug)]
pub struct TimeBudget {
    pool_ms: u64,
    increment_ms: u64,
    turn_start: Option<Instant>,
}

impl TimeBudget {
    pub fn new(initial_ms: u64, increment_ms: u64) -> Self {
        Self { pool_ms: initial_ms, increment_ms, turn_start: None }
    }

    /// Credit the per-turn increment and start timing the turn.
    pub fn begin_turn(&mut self) {
        self.pool_ms = self.pool_ms.saturating_add(self.increment_ms);
        self.turn_start = Some(Instant::now());
    }

    /// Budget left right now.
    pub fn remaining_ms(&self) -> u64 {
        let spent = self.turn_start.map_or(Duration::ZERO, |start| start.elapsed());
        self.remaining_after(spent)
    }

    fn remaining_after(&self, spent: Duration) -> u64 {
        let spent_ms = spent.as_millis().min(u64::MAX as u128) as u64;
        self.pool_ms.saturating_sub(spent_ms)
    }

    /// Close the turn, charging it `spent` of wall-clock time.
    ///
    /// `reported_ms` is the engine's own view of the remaining time, if any;
    /// the bucket never claims more than the engine grants.
    pub fn end_turn(&mut self, spent: Duration, reported_ms: Option<u64>) {
        let mut remaining = self.remaining_after(spent);
        if let Some(reported) = reported_ms {
            if reported < remaining {
                remaining = reported;
            }
        }
        if remaining == 0 {
            warn!("[BUDGET] Time pool exhausted");
        }
        self.pool_ms = remaining;
        self.turn_start = None;
    }

    /// Elapsed wall-clock time of the current turn.
    pub fn turn_elapsed(&self) -> Duration {
        self.turn_start.map_or(Duration::ZERO, |start| start.elapsed())
    }

    pub fn allows(&self, min_ms: u64) -> bool {
        self.remaining_ms().saturating_sub(SAFETY_MARGIN_MS) > min_ms
    }
}
