//! Hybrid time/behaviour bidding strategy.
//!
//! Each round the strategy computes a target utility by blending a
//! time-based concession curve with a tit-for-tat estimate that mirrors the
//! counterpart's recent concessions, then picks, among the bids close to that
//! target, the one with the best product of own and estimated counterpart
//! utility.

use std::sync::Arc;

use parley_core::{concession_curve, Bid, BidSpace, ConcessionRecord, ProgressClock, UtilitySpace};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BiddingConfig;
use crate::opponent::OpponentUtility;

/// Weights applied to the most recent 1..=4 utility deltas, oldest first.
const BEHAVIOUR_WEIGHTS: [&[f64]; 4] = [
    &[1.0],
    &[0.25, 0.75],
    &[0.11, 0.22, 0.66],
    &[0.05, 0.15, 0.3, 0.5],
];

/// Curve parameters in effect for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParams {
    /// Opening utility.
    pub p0: f64,
    /// Curve shape control point.
    pub p1: f64,
    /// Floor utility.
    pub p2: f64,
    /// Tit-for-tat reciprocation factor.
    pub p3: f64,
    /// Candidate tolerance below the target.
    pub window_lower: f64,
    /// Candidate tolerance above the target.
    pub window_upper: f64,
}

impl CurveParams {
    fn from_config(config: &BiddingConfig) -> Self {
        Self {
            p0: config.p0,
            p1: config.p1,
            p2: config.p2,
            p3: config.p3,
            window_lower: config.window_lower,
            window_upper: config.window_upper,
        }
    }
}

/// Generates the offers an agent proposes.
pub struct BiddingStrategy {
    config: BiddingConfig,
    params: CurveParams,
    profile: Arc<dyn UtilitySpace>,
    clock: Arc<dyn ProgressClock>,
    bid_space: BidSpace,
    my_offers: Vec<Bid>,
    received_offers: Vec<Bid>,
}

impl std::fmt::Debug for BiddingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiddingStrategy")
            .field("params", &self.params)
            .field("my_offers", &self.my_offers.len())
            .field("received_offers", &self.received_offers.len())
            .finish_non_exhaustive()
    }
}

impl BiddingStrategy {
    /// Creates a strategy over `profile`. Call [`BiddingStrategy::update`]
    /// before the first round to fit the parameters to the domain.
    #[must_use]
    pub fn new(
        profile: Arc<dyn UtilitySpace>,
        clock: Arc<dyn ProgressClock>,
        config: BiddingConfig,
    ) -> Self {
        let bid_space = BidSpace::new(profile.as_ref());
        Self {
            params: CurveParams::from_config(&config),
            config,
            profile,
            clock,
            bid_space,
            my_offers: Vec::new(),
            received_offers: Vec::new(),
        }
    }

    /// Current curve parameters.
    #[must_use]
    pub const fn params(&self) -> &CurveParams {
        &self.params
    }

    /// Offers proposed so far.
    #[must_use]
    pub fn my_offers(&self) -> &[Bid] {
        &self.my_offers
    }

    /// Offers received so far.
    #[must_use]
    pub fn received_offers(&self) -> &[Bid] {
        &self.received_offers
    }

    /// Records an offer from the counterpart; `None` is ignored.
    pub fn received_bid(&mut self, bid: Option<&Bid>) {
        if let Some(bid) = bid {
            self.received_offers.push(bid.clone());
        }
    }

    /// Re-derives the curve parameters from the counterpart's history.
    ///
    /// When the two latest records agree on `p1` within `epsilon`, the
    /// counterpart is predictable: the curve is raised, reciprocation is
    /// softened and the candidate window widens. A domain that also grew
    /// raises the curve and widens the window once more.
    /// `p0` never exceeds the best achievable utility and `p2` never drops
    /// below the worst achievable utility or the reservation value.
    pub fn update(&mut self, history: &[ConcessionRecord]) {
        let c = &self.config;
        let mut params = CurveParams::from_config(c);
        let mut p1_ratio = c.p1_ratio;

        if let [.., previous, current] = history {
            let stable = (previous.p1 - current.p1).abs() <= c.epsilon;
            if stable {
                p1_ratio += 0.1;
                params.p2 += 0.1;
                params.p3 = 0.2;
                params.window_lower += 0.01;
                params.window_upper += 0.01;
                if current.domain_size > previous.domain_size {
                    p1_ratio += 0.1;
                    params.window_lower += 0.01;
                    params.window_upper += 0.01;
                }
            }
        }

        let min_utility = self.bid_space.min_utility();
        let max_utility = self.bid_space.max_utility();
        let reservation = self.profile.reservation_utility().unwrap_or(f64::NEG_INFINITY);

        params.p0 = params.p0.min(max_utility).min(1.0);
        params.p2 = params.p2.max(min_utility).max(reservation).min(params.p0);
        params.p1 = ((params.p0 + params.p2) * p1_ratio)
            .max(params.p2)
            .min(params.p0);
        self.params = params;

        debug!(
            p0 = params.p0,
            p1 = params.p1,
            p2 = params.p2,
            p3 = params.p3,
            records = history.len(),
            "bidding parameters updated"
        );
    }

    /// Time-based target: the quadratic concession curve at `t`.
    #[must_use]
    pub fn time_based(&self, t: f64) -> f64 {
        concession_curve(self.params.p0, self.params.p1, self.params.p2, t)
    }

    /// Behaviour-based target, once there is one own offer and two received.
    #[must_use]
    pub fn behaviour_based(&self, t: f64) -> Option<f64> {
        let my_last = self.my_offers.last()?;
        if self.received_offers.len() < 2 {
            return None;
        }

        let utilities: Vec<f64> = self
            .received_offers
            .iter()
            .map(|b| self.profile.utility(b))
            .collect();
        let deltas: Vec<f64> = utilities.windows(2).map(|w| w[1] - w[0]).collect();
        let recent = &deltas[deltas.len().saturating_sub(BEHAVIOUR_WEIGHTS.len())..];
        let weights = BEHAVIOUR_WEIGHTS[recent.len() - 1];
        let delta: f64 = recent.iter().zip(weights.iter()).map(|(d, w)| d * w).sum();

        let p3 = self.params.p3;
        Some(self.profile.utility(my_last) - (p3 + p3 * t) * delta)
    }

    /// Target utility at `t`, clamped to `[p2, p0]`.
    #[must_use]
    pub fn target_utility(&self, t: f64) -> f64 {
        let time_utility = self.time_based(t);
        let target = match self.behaviour_based(t) {
            Some(behaviour_utility) => {
                let tt = t * t;
                (1.0 - tt) * behaviour_utility + tt * time_utility
            }
            None => time_utility,
        };
        target.max(self.params.p2).min(self.params.p0)
    }

    /// Picks the next offer. Returns `None` only for an empty domain.
    pub fn generate(&mut self, opponent: &dyn OpponentUtility) -> Option<Bid> {
        let t = self.clock.time();
        let target = self.target_utility(t);
        let selected = self.select(target, opponent)?;

        debug!(
            t,
            target,
            offered = self.profile.utility(&selected),
            "offer generated"
        );
        self.my_offers.push(selected.clone());
        Some(selected)
    }

    fn select(&self, target: f64, opponent: &dyn OpponentUtility) -> Option<Bid> {
        let low = (target - self.params.window_lower).max(self.params.p2);
        let high = target + self.params.window_upper;
        let candidates = self.bid_space.bids_in_range(low, high);

        if candidates.is_empty() {
            return self.bid_space.closest_to(target).map(|s| s.bid.clone());
        }

        let recent = &self.my_offers[self
            .my_offers
            .len()
            .saturating_sub(self.config.repetition_window)..];
        let fresh: Vec<_> = candidates
            .iter()
            .filter(|s| !recent.contains(&s.bid))
            .collect();
        let pool: Vec<_> = if fresh.is_empty() {
            candidates.iter().collect()
        } else {
            fresh
        };

        let mut best = pool[0];
        let mut best_score = opponent.estimate(&best.bid) * best.utility;
        for candidate in &pool[1..] {
            let score = opponent.estimate(&candidate.bid) * candidate.utility;
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }
        Some(best.bid.clone())
    }
}
