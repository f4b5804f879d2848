//! Cross-session learning.
//!
//! During a session the [`LearningModel`] collects every offer the
//! counterpart makes together with the progress at which it arrived. At the
//! end of the session those offers are scored with the opponent model and
//! distilled into one [`ConcessionRecord`]: the quadratic concession curve
//! that best explains how the counterpart conceded. The record is appended
//! to the counterpart's persisted history, which the bidding and acceptance
//! strategies read when the same counterpart is met again.

use std::sync::Arc;

use parley_core::{Bid, ConcessionRecord, ProgressClock, UtilitySpace};
use parley_persist::HistoryStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LearningConfig;
use crate::error::AgentError;
use crate::opponent::OpponentUtility;

/// Samples this close to the deadline have no defined regression target.
const DEADLINE_EPSILON: f64 = 1e-9;

/// Control points of a fitted concession curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveFit {
    /// Highest observed utility.
    pub p0: f64,
    /// Least-squares shape parameter.
    pub p1: f64,
    /// Lowest observed utility.
    pub p2: f64,
}

/// Fits `u(t) = (1-t)²·p0 + 2(1-t)t·p1 + t²·p2` to `(t, u)` samples.
///
/// `p0` and `p2` are the largest and smallest observed utilities. `p1` is
/// the zero-intercept least-squares slope of
/// `y = (u - (1-t)²·p0 - t²·p2) / (2(1-t))` against `t`. Samples at the
/// deadline take part in `p0`/`p2` but not in the regression.
///
/// Returns `None` when the regression is singular (every usable sample at
/// `t = 0`, or none at all) or produces a non-finite value.
#[must_use]
pub fn fit_concession_curve(samples: &[(f64, f64)]) -> Option<CurveFit> {
    let p0 = samples.iter().map(|&(_, u)| u).fold(f64::NEG_INFINITY, f64::max);
    let p2 = samples.iter().map(|&(_, u)| u).fold(f64::INFINITY, f64::min);
    if !p0.is_finite() || !p2.is_finite() {
        return None;
    }

    let (mut sxx, mut sxy) = (0.0, 0.0);
    for &(t, u) in samples {
        let s = 1.0 - t;
        if s <= DEADLINE_EPSILON {
            continue;
        }
        let y = (u - s * s * p0 - t * t * p2) / (2.0 * s);
        sxx += t * t;
        sxy += t * y;
    }

    if sxx <= f64::EPSILON {
        return None;
    }
    let p1 = sxy / sxx;
    p1.is_finite().then_some(CurveFit { p0, p1, p2 })
}

/// Why a session was not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The counterpart never identified itself.
    UnknownCounterpart,
    /// Too few offers were received to fit a curve.
    InsufficientOffers,
    /// The curve regression had no solution.
    SingularFit,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCounterpart => write!(f, "unknown counterpart"),
            Self::InsufficientOffers => write!(f, "insufficient offers"),
            Self::SingularFit => write!(f, "singular curve fit"),
        }
    }
}

/// Result of [`LearningModel::save_data`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SaveOutcome {
    /// The record was appended to the counterpart's history.
    Saved(ConcessionRecord),
    /// Nothing was written.
    Skipped(SkipReason),
    /// The store rejected the write. Produced by the agent, which keeps
    /// negotiating sessions alive across persistence failures.
    Failed(String),
}

impl SaveOutcome {
    /// Returns the saved record, if any.
    #[must_use]
    pub const fn record(&self) -> Option<&ConcessionRecord> {
        match self {
            Self::Saved(record) => Some(record),
            Self::Skipped(_) | Self::Failed(_) => None,
        }
    }

    /// Returns true if a record was written.
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

#[derive(Debug, Clone)]
struct Agreement {
    bid: Bid,
    time: f64,
    opponent_accepted: bool,
}

/// Collects one session's offers and persists the distilled curve.
pub struct LearningModel {
    clock: Arc<dyn ProgressClock>,
    config: LearningConfig,
    domain_size: usize,
    received: Vec<(f64, Bid)>,
    my_offers: Vec<Bid>,
    agreement: Option<Agreement>,
    history: Vec<ConcessionRecord>,
}

impl std::fmt::Debug for LearningModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningModel")
            .field("domain_size", &self.domain_size)
            .field("received", &self.received.len())
            .field("my_offers", &self.my_offers.len())
            .field("agreement", &self.agreement)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl LearningModel {
    /// Creates an empty model for one session over `profile`'s domain.
    #[must_use]
    pub fn new(
        profile: &dyn UtilitySpace,
        clock: Arc<dyn ProgressClock>,
        config: LearningConfig,
    ) -> Self {
        Self {
            clock,
            config,
            domain_size: profile.domain_size(),
            received: Vec::new(),
            my_offers: Vec::new(),
            agreement: None,
            history: Vec::new(),
        }
    }

    /// Records an offer from the counterpart at the current progress.
    pub fn receive_bid(&mut self, bid: Option<&Bid>) {
        if let Some(bid) = bid {
            self.received.push((self.clock.time(), bid.clone()));
        }
    }

    /// Records one of our own offers.
    pub fn save_bid(&mut self, bid: &Bid) {
        self.my_offers.push(bid.clone());
    }

    /// Records that the session reached `bid`.
    ///
    /// `opponent_accepted` is true when the counterpart accepted our offer,
    /// which is the only case the acceptance time is persisted for.
    pub fn reach_agreement(&mut self, bid: &Bid, opponent_accepted: bool) {
        let time = self.clock.time();
        debug!(%bid, time, opponent_accepted, "agreement reached");
        self.agreement = Some(Agreement {
            bid: bid.clone(),
            time,
            opponent_accepted,
        });
    }

    /// Loads the persisted history of `counterpart`, replacing any history
    /// held so far.
    pub fn load_data(
        &mut self,
        counterpart: &str,
        store: &dyn HistoryStore,
    ) -> &[ConcessionRecord] {
        self.history = store.load(counterpart);
        info!(counterpart, records = self.history.len(), "history loaded");
        &self.history
    }

    /// Distils the session into a [`ConcessionRecord`] and appends it to the
    /// history of `counterpart`.
    ///
    /// Sessions without a known counterpart, with fewer than
    /// `min_offers` received offers, or whose curve cannot be fitted are
    /// skipped without touching the store.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Persist`] if the store rejects the write.
    pub fn save_data(
        &mut self,
        counterpart: Option<&str>,
        opponent: &dyn OpponentUtility,
        store: &dyn HistoryStore,
    ) -> Result<SaveOutcome, AgentError> {
        let Some(counterpart) = counterpart else {
            return Ok(self.skip(SkipReason::UnknownCounterpart));
        };
        if self.received.len() < self.config.min_offers.max(1) {
            return Ok(self.skip(SkipReason::InsufficientOffers));
        }

        let samples: Vec<(f64, f64)> = self
            .received
            .iter()
            .map(|(t, bid)| (*t, opponent.estimate(bid)))
            .collect();
        let Some(fit) = fit_concession_curve(&samples) else {
            return Ok(self.skip(SkipReason::SingularFit));
        };

        let record = ConcessionRecord {
            p0: fit.p0,
            p1: fit.p1,
            p2: fit.p2,
            domain_size: self.domain_size,
            opponent_acceptance_time: self.opponent_acceptance_time(),
        };
        self.history = store.append(counterpart, record)?;
        info!(
            counterpart,
            p0 = record.p0,
            p1 = record.p1,
            p2 = record.p2,
            records = self.history.len(),
            "concession record saved"
        );
        Ok(SaveOutcome::Saved(record))
    }

    /// History loaded at session start, or the updated history after a save.
    #[must_use]
    pub fn history(&self) -> &[ConcessionRecord] {
        &self.history
    }

    /// Offers received so far with the progress they arrived at.
    #[must_use]
    pub fn received(&self) -> &[(f64, Bid)] {
        &self.received
    }

    /// Our own offers so far.
    #[must_use]
    pub fn my_offers(&self) -> &[Bid] {
        &self.my_offers
    }

    /// The agreed bid, if the session reached one.
    #[must_use]
    pub fn agreement(&self) -> Option<&Bid> {
        self.agreement.as_ref().map(|a| &a.bid)
    }

    /// Progress at which the counterpart accepted our offer, if it did.
    #[must_use]
    pub fn opponent_acceptance_time(&self) -> Option<f64> {
        self.agreement
            .as_ref()
            .filter(|a| a.opponent_accepted)
            .map(|a| a.time)
    }

    fn skip(&self, reason: SkipReason) -> SaveOutcome {
        debug!(%reason, received = self.received.len(), "session not persisted");
        SaveOutcome::Skipped(reason)
    }
}
