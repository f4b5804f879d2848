//! # parley-core
//!
//! Negotiation primitives shared by the Parley decision engine.
//!
//! This crate provides:
//!
//! - [`Bid`] and [`Domain`]: discrete multi-issue negotiation domains
//! - [`UtilitySpace`]: an agent's private preferences, with the
//!   [`LinearAdditiveUtilitySpace`] implementation
//! - [`ProgressClock`]: session progress towards the deadline
//! - [`BidSpace`]: own-utility index for window and nearest-bid queries
//! - [`ConcessionRecord`]: per-session concession summary kept across sessions
//!
//! ## Example
//!
//! ```rust
//! use parley_core::{Domain, IssueSpec};
//!
//! let domain = Domain::new(
//!     "lunch",
//!     vec![
//!         IssueSpec::new("dish", ["soup", "salad"]),
//!         IssueSpec::new("drink", ["water", "juice", "tea"]),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(domain.size(), 6);
//! assert_eq!(domain.all_bids().len(), 6);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bid;
pub mod bid_space;
pub mod clock;
pub mod error;
pub mod record;
pub mod utility;

pub use bid::{Bid, Domain, IssueSpec};
pub use bid_space::{BidSpace, ScoredBid};
pub use clock::{DeadlineClock, ManualClock, ProgressClock, RoundClock};
pub use error::CoreError;
pub use record::{concession_curve, ConcessionRecord};
pub use utility::{LinearAdditiveProfile, LinearAdditiveUtilitySpace, UtilitySpace};
