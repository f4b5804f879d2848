//! Negotiation progress clocks.
//!
//! A [`ProgressClock`] reports how far the session has progressed towards its
//! deadline as a fraction in `[0, 1]`: 0 at the start, 1 at the deadline.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Normalised session progress.
pub trait ProgressClock: Send + Sync {
    /// Current progress in `[0, 1]`, non-decreasing over a session.
    fn time(&self) -> f64;

    /// Returns true once the deadline has been reached.
    fn is_past_deadline(&self) -> bool {
        self.time() >= 1.0
    }
}

/// Wall-clock deadline: progress is elapsed time over the session duration.
#[derive(Debug, Clone)]
pub struct DeadlineClock {
    started_at: DateTime<Utc>,
    duration: Duration,
}

impl DeadlineClock {
    /// Starts a clock now that expires after `duration`.
    #[must_use]
    pub fn start(duration: Duration) -> Self {
        Self::starting_at(Utc::now(), duration)
    }

    /// Creates a clock with an explicit start (for testing).
    #[must_use]
    pub const fn starting_at(started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
        }
    }

    /// Progress at an arbitrary instant.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time_at(&self, now: DateTime<Utc>) -> f64 {
        let total = self.duration.num_milliseconds();
        if total <= 0 {
            return 1.0;
        }
        let elapsed = (now - self.started_at).num_milliseconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }
}

impl ProgressClock for DeadlineClock {
    fn time(&self) -> f64 {
        self.time_at(Utc::now())
    }
}

/// Round-based deadline: progress is rounds elapsed over the round budget.
#[derive(Debug)]
pub struct RoundClock {
    elapsed: AtomicU64,
    total: u64,
}

impl RoundClock {
    /// Creates a clock with a budget of `total` rounds.
    #[must_use]
    pub const fn new(total: u64) -> Self {
        Self {
            elapsed: AtomicU64::new(0),
            total,
        }
    }

    /// Marks one more round as elapsed.
    pub fn advance(&self) {
        let _ = self
            .elapsed
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_add(1).min(self.total))
            });
    }

    /// Rounds elapsed so far.
    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    /// Round budget.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }
}

impl ProgressClock for RoundClock {
    #[allow(clippy::cast_precision_loss)]
    fn time(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.elapsed() as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}

/// Clock driven explicitly by the host.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    /// Creates a clock at progress `t`.
    #[must_use]
    pub fn at(t: f64) -> Self {
        let clock = Self::default();
        clock.set(t);
        clock
    }

    /// Moves the clock to `t`; values are clamped to `[0, 1]` and never move
    /// the clock backwards.
    pub fn set(&self, t: f64) {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let _ = self
            .bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                (t > f64::from_bits(current)).then(|| t.to_bits())
            });
    }
}

impl ProgressClock for ManualClock {
    fn time(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
