//! Per-session concession summaries.

use serde::{Deserialize, Serialize};

/// Distilled summary of one finished session with a counterpart.
///
/// `p0`, `p1` and `p2` are the control points of the quadratic concession
/// curve fitted to the counterpart's offers. Records are immutable once
/// appended to a history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcessionRecord {
    /// Opening utility.
    pub p0: f64,
    /// Curve shape control point.
    pub p1: f64,
    /// Floor utility.
    pub p2: f64,
    /// Number of bids in the domain of that session.
    pub domain_size: usize,
    /// Progress at which the counterpart accepted, if it did.
    #[serde(default)]
    pub opponent_acceptance_time: Option<f64>,
}

impl ConcessionRecord {
    /// Evaluates the recorded curve at progress `t`.
    #[must_use]
    pub fn curve_at(&self, t: f64) -> f64 {
        concession_curve(self.p0, self.p1, self.p2, t)
    }

    /// Returns true if the counterpart accepted one of our offers.
    #[must_use]
    pub const fn opponent_accepted(&self) -> bool {
        self.opponent_acceptance_time.is_some()
    }
}

/// Quadratic Bézier concession curve through `p0` at `t = 0` and `p2` at `t = 1`.
#[must_use]
pub fn concession_curve(p0: f64, p1: f64, p2: f64, t: f64) -> f64 {
    let s = 1.0 - t;
    s * s * p0 + 2.0 * s * t * p1 + t * t * p2
}
