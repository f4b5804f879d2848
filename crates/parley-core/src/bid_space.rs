//! Own-utility index over every bid of a domain.
//!
//! [`BidSpace`] scores every bid once and keeps them sorted by utility, so the
//! per-round queries (bids inside a utility window, the bid closest to a
//! target) are binary searches instead of full scans.

use crate::bid::Bid;
use crate::utility::UtilitySpace;

/// A bid paired with its own utility.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBid {
    /// Own utility of the bid.
    pub utility: f64,
    /// The bid.
    pub bid: Bid,
}

/// Every bid of a domain, sorted by ascending own utility.
#[derive(Debug, Clone, Default)]
pub struct BidSpace {
    bids: Vec<ScoredBid>,
}

impl BidSpace {
    /// Scores and sorts every bid of `space`.
    #[must_use]
    pub fn new(space: &dyn UtilitySpace) -> Self {
        let mut bids: Vec<ScoredBid> = space
            .all_bids()
            .iter()
            .map(|bid| ScoredBid {
                utility: space.utility(bid),
                bid: bid.clone(),
            })
            .collect();
        bids.sort_by(|a, b| a.utility.total_cmp(&b.utility));
        Self { bids }
    }

    /// Number of bids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bids.len()
    }

    /// Returns true when the domain has no bids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }

    /// All bids, ascending by utility.
    #[must_use]
    pub fn as_slice(&self) -> &[ScoredBid] {
        &self.bids
    }

    /// Bids whose utility lies in `[low, high]`, ascending by utility.
    #[must_use]
    pub fn bids_in_range(&self, low: f64, high: f64) -> &[ScoredBid] {
        if low > high {
            return &[];
        }
        let start = self.bids.partition_point(|s| s.utility < low);
        let end = self.bids.partition_point(|s| s.utility <= high);
        &self.bids[start..end.max(start)]
    }

    /// The bid whose utility is numerically closest to `target`.
    #[must_use]
    pub fn closest_to(&self, target: f64) -> Option<&ScoredBid> {
        let idx = self.bids.partition_point(|s| s.utility < target);
        let above = self.bids.get(idx);
        let below = idx.checked_sub(1).and_then(|i| self.bids.get(i));
        match (below, above) {
            (Some(b), Some(a)) => {
                if (target - b.utility).abs() <= (a.utility - target).abs() {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, a) => a,
        }
    }

    /// Lowest utility over the domain, or 0 for an empty domain.
    #[must_use]
    pub fn min_utility(&self) -> f64 {
        self.bids.first().map_or(0.0, |s| s.utility)
    }

    /// Highest utility over the domain, or 0 for an empty domain.
    #[must_use]
    pub fn max_utility(&self) -> f64 {
        self.bids.last().map_or(0.0, |s| s.utility)
    }
}
