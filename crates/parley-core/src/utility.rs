//! Utility spaces: how an agent scores bids.
//!
//! The decision engine only talks to the [`UtilitySpace`] trait. The
//! [`LinearAdditiveUtilitySpace`] implementation covers the usual case of a
//! weighted sum of per-issue value utilities.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bid::{Bid, Domain};
use crate::error::CoreError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Read-only view of an agent's private preferences.
pub trait UtilitySpace: Send + Sync {
    /// The domain the utilities are defined over.
    fn domain(&self) -> &Domain;

    /// Utility of `bid`, always within `[0, 1]`.
    fn utility(&self, bid: &Bid) -> f64;

    /// The bid the agent gets by walking away, if the profile defines one.
    fn reservation_bid(&self) -> Option<&Bid>;

    /// Every bid of the domain, in enumeration order.
    fn all_bids(&self) -> &[Bid];

    /// Utility of the reservation bid, or `None` when there is none.
    fn reservation_utility(&self) -> Option<f64> {
        self.reservation_bid().map(|bid| self.utility(bid))
    }

    /// Number of bids in the domain.
    fn domain_size(&self) -> usize {
        self.all_bids().len()
    }
}

/// Serialized form of a linear-additive preference profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearAdditiveProfile {
    /// Profile name, for logs.
    #[serde(default)]
    pub name: String,
    /// Domain the profile is defined over.
    pub domain: Domain,
    /// Weight of every issue; must sum to 1.
    pub issue_weights: HashMap<String, f64>,
    /// Utility of every value of every issue, each within `[0, 1]`.
    pub value_utilities: HashMap<String, HashMap<String, f64>>,
    /// Optional reservation bid.
    #[serde(default)]
    pub reservation_bid: Option<Bid>,
}

impl LinearAdditiveProfile {
    /// Reads a profile from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::InvalidProfile(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// A utility function that is a weighted sum of per-issue value utilities.
#[derive(Debug, Clone)]
pub struct LinearAdditiveUtilitySpace {
    name: String,
    domain: Domain,
    issue_weights: HashMap<String, f64>,
    value_utilities: HashMap<String, HashMap<String, f64>>,
    reservation_bid: Option<Bid>,
    bids: Vec<Bid>,
}

impl LinearAdditiveUtilitySpace {
    /// Builds and validates a utility space from a profile.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidProfile`] when weights are negative or do
    /// not sum to 1, a value utility falls outside `[0, 1]`, or an issue or
    /// value of the domain has no entry. Domain errors are passed through.
    pub fn new(profile: LinearAdditiveProfile) -> Result<Self, CoreError> {
        profile.domain.validate()?;

        let mut total = 0.0;
        for issue in &profile.domain.issues {
            let weight = *profile.issue_weights.get(&issue.name).ok_or_else(|| {
                CoreError::InvalidProfile(format!("no weight for issue '{}'", issue.name))
            })?;
            if !(0.0..=1.0).contains(&weight) {
                return Err(CoreError::InvalidProfile(format!(
                    "weight of '{}' must be within [0, 1], got {weight}",
                    issue.name
                )));
            }
            total += weight;

            let values = profile.value_utilities.get(&issue.name).ok_or_else(|| {
                CoreError::InvalidProfile(format!("no value utilities for issue '{}'", issue.name))
            })?;
            for value in &issue.values {
                let u = *values.get(value).ok_or_else(|| {
                    CoreError::InvalidProfile(format!(
                        "no utility for value '{value}' of issue '{}'",
                        issue.name
                    ))
                })?;
                if !(0.0..=1.0).contains(&u) {
                    return Err(CoreError::InvalidProfile(format!(
                        "utility of '{}'='{value}' must be within [0, 1], got {u}",
                        issue.name
                    )));
                }
            }
        }
        if !profile.domain.issues.is_empty() && (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(CoreError::InvalidProfile(format!(
                "issue weights must sum to 1, got {total}"
            )));
        }
        if let Some(reservation) = &profile.reservation_bid {
            profile.domain.check_bid(reservation)?;
        }

        let bids = profile.domain.all_bids();
        Ok(Self {
            name: profile.name,
            domain: profile.domain,
            issue_weights: profile.issue_weights,
            value_utilities: profile.value_utilities,
            reservation_bid: profile.reservation_bid,
            bids,
        })
    }

    /// Profile name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Weight of `issue`, or 0 for an unknown issue.
    #[must_use]
    pub fn issue_weight(&self, issue: &str) -> f64 {
        self.issue_weights.get(issue).copied().unwrap_or(0.0)
    }
}

impl UtilitySpace for LinearAdditiveUtilitySpace {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    fn utility(&self, bid: &Bid) -> f64 {
        let total: f64 = self
            .domain
            .issues
            .iter()
            .filter_map(|issue| {
                let value = bid.value(&issue.name)?;
                let u = self.value_utilities.get(&issue.name)?.get(value)?;
                Some(self.issue_weight(&issue.name) * u)
            })
            .sum();
        total.clamp(0.0, 1.0)
    }

    fn reservation_bid(&self) -> Option<&Bid> {
        self.reservation_bid.as_ref()
    }

    fn all_bids(&self) -> &[Bid] {
        &self.bids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bid::IssueSpec;
    use proptest::prelude::*;

    fn profile() -> LinearAdditiveProfile {
        let domain = Domain::new(
            "holiday",
            vec![
                IssueSpec::new("place", ["beach", "city"]),
                IssueSpec::new("days", ["3", "7", "14"]),
            ],
        )
        .unwrap();
        LinearAdditiveProfile {
            name: "tourist".into(),
            domain,
            issue_weights: HashMap::from([("place".into(), 0.7), ("days".into(), 0.3)]),
            value_utilities: HashMap::from([
                (
                    "place".into(),
                    HashMap::from([("beach".into(), 1.0), ("city".into(), 0.2)]),
                ),
                (
                    "days".into(),
                    HashMap::from([("3".into(), 0.0), ("7".into(), 0.5), ("14".into(), 1.0)]),
                ),
            ]),
            reservation_bid: None,
        }
    }

    #[test]
    fn utility_is_weighted_sum() {
        let space = LinearAdditiveUtilitySpace::new(profile()).unwrap();
        let best = Bid::new([("place", "beach"), ("days", "14")]);
        let mid = Bid::new([("place", "city"), ("days", "7")]);
        assert!((space.utility(&best) - 1.0).abs() < 1e-12);
        assert!((space.utility(&mid) - (0.7 * 0.2 + 0.3 * 0.5)).abs() < 1e-12);
        assert_eq!(space.domain_size(), 6);
        assert_eq!(space.reservation_utility(), None);
    }

    #[test]
    fn unknown_values_contribute_nothing() {
        let space = LinearAdditiveUtilitySpace::new(profile()).unwrap();
        let odd = Bid::new([("place", "moon"), ("days", "14")]);
        assert!((space.utility(&odd) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn reservation_utility_is_reported() {
        let mut p = profile();
        p.reservation_bid = Some(Bid::new([("place", "city"), ("days", "3")]));
        let space = LinearAdditiveUtilitySpace::new(p).unwrap();
        let r = space.reservation_utility().unwrap();
        assert!((r - 0.14).abs() < 1e-12);
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut p = profile();
        p.issue_weights.insert("days".into(), 0.5);
        assert!(matches!(
            LinearAdditiveUtilitySpace::new(p),
            Err(CoreError::InvalidProfile(_))
        ));
    }

    #[test]
    fn rejects_missing_value_utility() {
        let mut p = profile();
        if let Some(days) = p.value_utilities.get_mut("days") {
            days.remove("7");
        }
        assert!(LinearAdditiveUtilitySpace::new(p).is_err());
    }

    #[test]
    fn rejects_out_of_range_value_utility() {
        let mut p = profile();
        if let Some(place) = p.value_utilities.get_mut("place") {
            place.insert("city".into(), 1.5);
        }
        assert!(LinearAdditiveUtilitySpace::new(p).is_err());
    }

    #[test]
    fn profile_parses_from_json() {
        let json = serde_json::to_string(&profile()).unwrap();
        let parsed: LinearAdditiveProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile());
    }

    proptest! {
        #[test]
        fn utilities_stay_in_unit_interval(
            w in 0.0f64..=1.0,
            a in 0.0f64..=1.0,
            b in 0.0f64..=1.0,
        ) {
            let mut p = profile();
            p.issue_weights = HashMap::from([("place".into(), w), ("days".into(), 1.0 - w)]);
            p.value_utilities.insert(
                "place".into(),
                HashMap::from([("beach".into(), a), ("city".into(), b)]),
            );
            let space = LinearAdditiveUtilitySpace::new(p).unwrap();
            for bid in space.all_bids() {
                let u = space.utility(bid);
                prop_assert!((0.0..=1.0).contains(&u));
            }
        }
    }
}
