//! `AC_Next` acceptance with a learned floor.
//!
//! Accept the counterpart's offer when it is worth at least as much as the
//! offer we were about to send, and never less than the floor.

use std::sync::Arc;

use parley_core::{Bid, ConcessionRecord, UtilitySpace};
use tracing::debug;

use crate::config::AcceptanceConfig;

/// Decides whether to accept the counterpart's last offer.
pub struct AcceptanceStrategy {
    config: AcceptanceConfig,
    floor: f64,
    profile: Arc<dyn UtilitySpace>,
}

impl std::fmt::Debug for AcceptanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptanceStrategy")
            .field("config", &self.config)
            .field("floor", &self.floor)
            .finish_non_exhaustive()
    }
}

impl AcceptanceStrategy {
    /// Creates a strategy with the configured floor.
    #[must_use]
    pub fn new(profile: Arc<dyn UtilitySpace>, config: AcceptanceConfig) -> Self {
        Self {
            floor: config.floor,
            config,
            profile,
        }
    }

    /// Utility below which nothing is accepted.
    #[must_use]
    pub const fn floor(&self) -> f64 {
        self.floor
    }

    /// Returns true if `received` should be accepted instead of sending
    /// `generated`. Always false when nothing has been received.
    #[must_use]
    pub fn is_accepted(&self, received: Option<&Bid>, generated: &Bid) -> bool {
        let Some(received) = received else {
            return false;
        };
        let received_utility = self.profile.utility(received);
        let generated_utility = self.profile.utility(generated);
        let accept = generated_utility.max(self.floor) <= received_utility;
        debug!(
            received_utility,
            generated_utility,
            floor = self.floor,
            accept,
            "acceptance check"
        );
        accept
    }

    /// Re-derives the floor from the counterpart's history: two consecutive
    /// records with `p2` within `epsilon` raise the floor to their midpoint.
    pub fn update(&mut self, history: &[ConcessionRecord]) {
        self.floor = self.config.floor;
        if let [.., previous, current] = history {
            if (previous.p2 - current.p2).abs() <= self.config.epsilon {
                let midpoint = f64::midpoint(previous.p2, current.p2).clamp(0.0, 1.0);
                self.floor = self.floor.max(midpoint);
            }
        }
        debug!(floor = self.floor, records = history.len(), "acceptance floor updated");
    }
}
