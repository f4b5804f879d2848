//! # parley-agent
//!
//! Decision engine of a bilateral negotiation agent.
//!
//! This crate provides:
//!
//! - **Opponent model** - [`OpponentModel`] estimates the counterpart's utility from its offers
//! - **Bidding** - [`BiddingStrategy`] blends a concession curve with tit-for-tat and picks offers
//! - **Acceptance** - [`AcceptanceStrategy`] accepts offers at least as good as our next one
//! - **Learning** - [`LearningModel`] distils each session into a persisted [`parley_core::ConcessionRecord`]
//! - **Agent** - [`NegotiationAgent`] drives all four from host [`NegotiationEvent`]s
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use parley_agent::{AgentConfig, NegotiationAgent, NegotiationEvent, SessionContext};
//! use parley_core::{Domain, IssueSpec, LinearAdditiveProfile, LinearAdditiveUtilitySpace, ManualClock};
//! use parley_persist::MemoryHistoryStore;
//!
//! let domain = Domain::new("fruit", vec![IssueSpec::new("kind", ["apple", "pear"])]).unwrap();
//! let profile = LinearAdditiveUtilitySpace::new(LinearAdditiveProfile {
//!     name: "me".into(),
//!     domain,
//!     issue_weights: HashMap::from([("kind".into(), 1.0)]),
//!     value_utilities: HashMap::from([(
//!         "kind".into(),
//!         HashMap::from([("apple".into(), 1.0), ("pear".into(), 0.2)]),
//!     )]),
//!     reservation_bid: None,
//! })
//! .unwrap();
//!
//! let context = SessionContext::new(Arc::new(profile), Arc::new(ManualClock::at(0.0)));
//! let mut agent =
//!     NegotiationAgent::new(context, AgentConfig::default(), Arc::new(MemoryHistoryStore::new())).unwrap();
//!
//! let action = agent.handle(NegotiationEvent::TurnRequested).unwrap().unwrap();
//! assert!(action.is_offer());
//! assert_eq!(action.bid().value("kind"), Some("apple"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod acceptance;
pub mod agent;
pub mod bidding;
pub mod config;
pub mod error;
pub mod harness;
pub mod learning;
pub mod opponent;
pub mod session;
pub mod stats;

pub use error::AgentError;

// Re-exports for convenience
pub use acceptance::AcceptanceStrategy;
pub use agent::{Action, AgentPhase, NegotiationAgent, NegotiationEvent};
pub use bidding::{BiddingStrategy, CurveParams};
pub use config::{AcceptanceConfig, AgentConfig, BiddingConfig, LearningConfig, OpponentModelConfig};
pub use harness::{run_alternating, SessionOutcome};
pub use learning::{fit_concession_curve, CurveFit, LearningModel, SaveOutcome, SkipReason};
pub use opponent::{IssueModel, OpponentModel, OpponentUtility};
pub use session::{counterpart_identity, SessionContext};
pub use stats::{chi_square_sf, chi_square_test, ChiSquareTest};
