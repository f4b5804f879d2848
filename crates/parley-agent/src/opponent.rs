//! Frequency-based opponent model.
//!
//! Estimates the counterpart's utility function from the offers it makes.
//! Value weights come from dampened occurrence counts; issue weights adapt
//! every window of offers: an issue whose value distribution stayed put while
//! the counterpart conceded on other issues is probably one it cares about.
//!
//! The model is mutated only by [`OpponentModel::update`] and is not meant
//! for concurrent `update` calls.

use std::collections::HashMap;
use std::sync::Arc;

use parley_core::{Bid, Domain, ProgressClock};
use tracing::{debug, trace, warn};

use crate::config::OpponentModelConfig;
use crate::stats::chi_square_test;

/// Anything that can score a bid from the counterpart's point of view.
///
/// Scores are non-negative but not normalised; only comparisons between
/// scores from the same estimator are meaningful.
pub trait OpponentUtility {
    /// Estimated counterpart utility of `bid`.
    fn estimate(&self, bid: &Bid) -> f64;
}

#[derive(Debug, Clone)]
struct ValueStat {
    value: String,
    count: f64,
    weight: f64,
}

/// Per-issue state of the opponent model.
#[derive(Debug, Clone)]
pub struct IssueModel {
    name: String,
    weight: f64,
    values: Vec<ValueStat>,
    index: HashMap<String, usize>,
}

impl IssueModel {
    fn new(name: &str, values: &[String], weight: f64) -> Self {
        Self {
            name: name.to_string(),
            weight,
            values: values
                .iter()
                .map(|v| ValueStat {
                    value: v.clone(),
                    count: 1.0,
                    weight: 1.0,
                })
                .collect(),
            index: values
                .iter()
                .enumerate()
                .map(|(i, v)| (v.clone(), i))
                .collect(),
        }
    }

    /// Issue name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current issue weight.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Current weight of `value`, if it is a legal value of this issue.
    #[must_use]
    pub fn value_weight(&self, value: &str) -> Option<f64> {
        self.index.get(value).map(|&i| self.values[i].weight)
    }

    /// Times `value` has been offered, plus the smoothing prior of one.
    #[must_use]
    pub fn count(&self, value: &str) -> Option<f64> {
        self.index.get(value).map(|&i| self.values[i].count)
    }

    fn observe(&mut self, value: &str, gamma: f64) -> bool {
        let Some(&i) = self.index.get(value) else {
            return false;
        };
        self.values[i].count += 1.0;
        let max = self
            .values
            .iter()
            .map(|v| v.count)
            .fold(f64::MIN_POSITIVE, f64::max);
        let scale = max.powf(gamma);
        for v in &mut self.values {
            v.weight = v.count.powf(gamma) / scale;
        }
        true
    }

    fn utility(&self, value: Option<&str>) -> f64 {
        value
            .and_then(|v| self.value_weight(v))
            .map_or(0.0, |w| self.weight * w)
    }

    /// Smoothed frequency `(1 + occurrences) / window_len` of every value, in
    /// declaration order.
    #[allow(clippy::cast_precision_loss)]
    fn frequencies(&self, window: &[Bid]) -> Vec<f64> {
        let len = window.len().max(1) as f64;
        self.values
            .iter()
            .map(|v| {
                let hits = window
                    .iter()
                    .filter(|bid| bid.value(&self.name) == Some(v.value.as_str()))
                    .count();
                (1.0 + hits as f64) / len
            })
            .collect()
    }

    fn weighted_frequency(&self, frequencies: &[f64]) -> f64 {
        frequencies
            .iter()
            .zip(&self.values)
            .map(|(f, v)| f * v.weight)
            .sum()
    }
}

/// Estimate of the counterpart's preferences, learned from its offers.
pub struct OpponentModel {
    config: OpponentModelConfig,
    clock: Arc<dyn ProgressClock>,
    issues: Vec<IssueModel>,
    offers: Vec<Bid>,
}

impl std::fmt::Debug for OpponentModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpponentModel")
            .field("config", &self.config)
            .field("issues", &self.issues)
            .field("offers", &self.offers.len())
            .finish_non_exhaustive()
    }
}

impl OpponentModel {
    /// Creates a model with uniform issue weights over `domain`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(
        domain: &Domain,
        clock: Arc<dyn ProgressClock>,
        config: OpponentModelConfig,
    ) -> Self {
        let uniform = if domain.issues.is_empty() {
            0.0
        } else {
            1.0 / domain.issues.len() as f64
        };
        Self {
            config,
            clock,
            issues: domain
                .issues
                .iter()
                .map(|spec| IssueModel::new(&spec.name, &spec.values, uniform))
                .collect(),
            offers: Vec::new(),
        }
    }

    /// Ingests one observed offer; `None` is ignored.
    pub fn update(&mut self, bid: Option<&Bid>) {
        let Some(bid) = bid else {
            return;
        };
        self.offers.push(bid.clone());

        for issue in &mut self.issues {
            match bid.value(&issue.name) {
                Some(value) => {
                    if !issue.observe(value, self.config.gamma) {
                        warn!(issue = %issue.name, value, "offer uses a value outside the domain");
                    }
                }
                None => warn!(issue = %issue.name, "offer leaves an issue unassigned"),
            }
        }

        let w = self.config.window_size;
        let n = self.offers.len();
        if w > 0 && n % w == 0 && n > w {
            self.adapt_issue_weights(n - 2 * w, n - w, n);
        }
    }

    /// Estimated counterpart utility of `bid`; 0 for `None`.
    #[must_use]
    pub fn utility(&self, bid: Option<&Bid>) -> f64 {
        bid.map_or(0.0, |b| self.estimate(b))
    }

    /// Per-issue state, in domain order.
    #[must_use]
    pub fn issues(&self) -> &[IssueModel] {
        &self.issues
    }

    /// Weight of `issue`, if the domain defines it.
    #[must_use]
    pub fn issue_weight(&self, issue: &str) -> Option<f64> {
        self.issue(issue).map(IssueModel::weight)
    }

    /// Looks up the model of one issue.
    #[must_use]
    pub fn issue(&self, name: &str) -> Option<&IssueModel> {
        self.issues.iter().find(|i| i.name == name)
    }

    /// Offers observed so far.
    #[must_use]
    pub fn offers(&self) -> &[Bid] {
        &self.offers
    }

    fn adapt_issue_weights(&mut self, prev_start: usize, cur_start: usize, end: usize) {
        let t = self.clock.time();
        let previous = &self.offers[prev_start..cur_start];
        let current = &self.offers[cur_start..end];

        let mut unchanged = Vec::new();
        let mut conceded = false;
        for (i, issue) in self.issues.iter().enumerate() {
            let fr_previous = issue.frequencies(previous);
            let fr_current = issue.frequencies(current);
            let test = chi_square_test(&fr_previous, &fr_current);
            trace!(issue = %issue.name, p_value = test.p_value, "window comparison");

            if test.p_value > self.config.significance {
                unchanged.push(i);
            } else if issue.weighted_frequency(&fr_current)
                < issue.weighted_frequency(&fr_previous)
            {
                conceded = true;
            }
        }

        if conceded && unchanged.len() != self.issues.len() {
            let boost = self.config.alpha * (1.0 - t.powf(self.config.beta));
            for &i in &unchanged {
                self.issues[i].weight += boost;
            }
            debug!(boosted = unchanged.len(), boost, t, "issue weights boosted");
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let total: f64 = self.issues.iter().map(|i| i.weight).sum();
        let total = total.max(f64::MIN_POSITIVE);
        for issue in &mut self.issues {
            issue.weight /= total;
        }
    }
}

impl OpponentUtility for OpponentModel {
    fn estimate(&self, bid: &Bid) -> f64 {
        self.issues
            .iter()
            .map(|issue| issue.utility(bid.value(&issue.name)))
            .sum()
    }
}
