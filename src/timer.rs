//! The countdown state machine.
//!
//! Time is never accumulated tick by tick. Each run segment stores the
//! monotonic instant it began at plus the total in effect at that instant, and
//! every recompute derives the current value from those two. Ticks can be late
//! or skipped without drift, and pausing is exact.
//!
//! When a countdown reaches zero the timer records one completion and keeps
//! running in the other direction, accumulating overtime until reset.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::LogError;
use crate::history::{CompletionLog, CompletionSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Counting down toward zero.
    Down,
    /// Counting up overtime after the interval completed.
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped(Direction),
    Running(Direction),
}

/// What a recompute did.
#[derive(Debug)]
pub enum Tick {
    /// Nothing was recomputed.
    Idle,
    /// Remaining time was updated.
    Advanced,
    /// The countdown reached zero and a completion was handed to the log,
    /// with the outcome of persisting it. The timer has already switched to
    /// overtime regardless of that outcome.
    Completed(Result<(), LogError>),
}

impl Tick {
    pub fn is_completed(&self) -> bool {
        matches!(self, Tick::Completed(_))
    }
}

pub struct CountdownTimer<S = CompletionLog, C = SystemClock> {
    configured: Duration,
    anchor: Instant,
    total_at_anchor: Duration,
    remaining: Duration,
    running: bool,
    counting_down: bool,
    fired: bool,
    log: S,
    clock: C,
}

impl<S: CompletionSink> CountdownTimer<S, SystemClock> {
    pub fn new(configured: Duration, log: S) -> Self {
        Self::with_clock(configured, log, SystemClock)
    }
}

impl<S: CompletionSink, C: Clock> CountdownTimer<S, C> {
    pub fn with_clock(configured: Duration, log: S, clock: C) -> Self {
        let anchor = clock.now();
        Self {
            configured,
            anchor,
            total_at_anchor: configured,
            remaining: configured,
            running: false,
            counting_down: true,
            fired: false,
            log,
            clock,
        }
    }

    /// Begin a run segment from the current remaining time. Calling this while
    /// running re-anchors at the last computed value.
    pub fn start(&mut self) {
        self.total_at_anchor = self.remaining;
        self.anchor = self.clock.now();
        self.running = true;
        debug!(remaining = ?self.remaining, counting_down = self.counting_down, "timer started");
    }

    /// Recompute once more and freeze. Does nothing when already stopped.
    pub fn stop(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        let outcome = self.advance();
        self.running = false;
        debug!(remaining = ?self.remaining, counting_down = self.counting_down, "timer stopped");
        outcome
    }

    /// Recompute remaining time. Skipped while stopped.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.advance()
    }

    /// Stop, then return to a fresh countdown of the configured length.
    pub fn reset(&mut self) -> Tick {
        let outcome = self.stop();
        self.anchor = self.clock.now();
        self.total_at_anchor = self.configured;
        self.remaining = self.configured;
        self.counting_down = true;
        self.fired = false;
        debug!(configured = ?self.configured, "timer reset");
        outcome
    }

    pub fn toggle(&mut self) -> Tick {
        if self.running {
            self.stop()
        } else {
            self.start();
            Tick::Idle
        }
    }

    fn advance(&mut self) -> Tick {
        let elapsed = self.clock.now().saturating_duration_since(self.anchor);
        self.remaining = if self.counting_down {
            self.total_at_anchor.saturating_sub(elapsed)
        } else {
            self.total_at_anchor + elapsed
        };

        if self.remaining.is_zero() && self.counting_down && !self.fired {
            let result = self.log.record(self.clock.wall());
            self.fired = true;
            self.counting_down = false;
            self.start();
            info!(persisted = result.is_ok(), "work interval complete, counting overtime");
            return Tick::Completed(result);
        }

        Tick::Advanced
    }

    /// Time left while counting down, overtime while counting up.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Whole seconds for display. Rounds up while counting down so the clock
    /// shows the full interval at start and only reads zero on completion.
    pub fn display_seconds(&self) -> u64 {
        let secs = self.remaining.as_secs();
        if self.counting_down && self.remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    /// Fraction of the countdown that has elapsed, 1.0 once in overtime.
    pub fn progress(&self) -> f64 {
        if !self.counting_down || self.configured.is_zero() {
            return 1.0;
        }
        let ratio = self.remaining.as_secs_f64() / self.configured.as_secs_f64();
        (1.0 - ratio).clamp(0.0, 1.0)
    }

    pub fn state(&self) -> TimerState {
        let direction = if self.counting_down {
            Direction::Down
        } else {
            Direction::Up
        };
        if self.running {
            TimerState::Running(direction)
        } else {
            TimerState::Stopped(direction)
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_counting_down(&self) -> bool {
        self.counting_down
    }

    pub fn has_fired_completion(&self) -> bool {
        self.fired
    }

    pub fn configured(&self) -> Duration {
        self.configured
    }

    pub fn log(&self) -> &S {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut S {
        &mut self.log
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
