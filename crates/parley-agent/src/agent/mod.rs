//! Event-driven negotiation agent.
//!
//! The host protocol layer translates its messages into
//! [`NegotiationEvent`]s and feeds them to [`NegotiationAgent::handle`],
//! which answers every [`NegotiationEvent::TurnRequested`] with exactly one
//! [`Action`]. The agent wires the four components together:
//!
//! - offers received update the [`OpponentModel`], [`BiddingStrategy`] and
//!   [`LearningModel`]
//! - a turn generates an offer and asks the [`AcceptanceStrategy`] whether
//!   the counterpart's last offer beats it
//! - the end of the session distils the counterpart's concession curve into
//!   its persisted history

use std::sync::Arc;

use parley_core::Bid;
use parley_persist::HistoryStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::acceptance::AcceptanceStrategy;
use crate::bidding::BiddingStrategy;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::learning::{LearningModel, SaveOutcome};
use crate::opponent::OpponentModel;
use crate::session::{counterpart_identity, SessionContext};


/// Something the host tells the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationEvent {
    /// The counterpart proposed `bid`.
    OfferReceived {
        /// Party id of the sender.
        from: String,
        /// The proposal.
        bid: Bid,
    },
    /// The counterpart accepted our offer `bid`.
    AcceptReceived {
        /// Party id of the sender.
        from: String,
        /// The accepted bid.
        bid: Bid,
    },
    /// It is our turn to act.
    TurnRequested,
    /// The session is over, with or without an agreement.
    SessionEnded {
        /// The agreed bid, if any.
        agreement: Option<Bid>,
    },
    /// Anything else the host forwards; ignored.
    Other(String),
}

/// The agent's answer to a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "bid", rename_all = "snake_case")]
pub enum Action {
    /// Accept the counterpart's last offer.
    Accept(Bid),
    /// Propose a new bid.
    Offer(Bid),
}

impl Action {
    /// The bid accepted or proposed.
    #[must_use]
    pub const fn bid(&self) -> &Bid {
        match self {
            Self::Accept(bid) | Self::Offer(bid) => bid,
        }
    }

    /// Returns true for [`Action::Accept`].
    #[must_use]
    pub const fn is_accept(&self) -> bool {
        matches!(self, Self::Accept(_))
    }

    /// Returns true for [`Action::Offer`].
    #[must_use]
    pub const fn is_offer(&self) -> bool {
        matches!(self, Self::Offer(_))
    }
}

/// Lifecycle of an agent within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentPhase {
    /// Accepting events.
    Negotiating,
    /// The session ended; further events are ignored.
    Ended,
}

/// One negotiation session's decision engine.
///
/// Not safe for concurrent `handle` calls; the host drives it one event at
/// a time.
pub struct NegotiationAgent {
    context: SessionContext,
    store: Arc<dyn HistoryStore>,
    opponent: OpponentModel,
    bidding: BiddingStrategy,
    acceptance: AcceptanceStrategy,
    learning: LearningModel,
    last_received: Option<Bid>,
    phase: AgentPhase,
    save_outcome: Option<SaveOutcome>,
}

impl std::fmt::Debug for NegotiationAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegotiationAgent")
            .field("context", &self.context)
            .field("phase", &self.phase)
            .field("last_received", &self.last_received)
            .field("save_outcome", &self.save_outcome)
            .finish_non_exhaustive()
    }
}

impl NegotiationAgent {
    /// Creates an agent for one session.
    ///
    /// If the context already names the counterpart, its history is loaded
    /// and applied before the first round.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        context: SessionContext,
        config: AgentConfig,
        store: Arc<dyn HistoryStore>,
    ) -> Result<Self, AgentError> {
        config.validate()?;

        let profile = Arc::clone(&context.profile);
        let clock = Arc::clone(&context.clock);
        let opponent = OpponentModel::new(profile.domain(), Arc::clone(&clock), config.opponent);
        let mut bidding =
            BiddingStrategy::new(Arc::clone(&profile), Arc::clone(&clock), config.bidding);
        bidding.update(&[]);
        let acceptance = AcceptanceStrategy::new(Arc::clone(&profile), config.acceptance);
        let learning = LearningModel::new(profile.as_ref(), clock, config.learning);

        let mut agent = Self {
            context,
            store,
            opponent,
            bidding,
            acceptance,
            learning,
            last_received: None,
            phase: AgentPhase::Negotiating,
            save_outcome: None,
        };
        if let Some(counterpart) = agent.context.counterpart.clone() {
            agent.load_history(&counterpart);
        }
        info!(
            session = %agent.context.session_id,
            domain = %agent.context.profile.domain().name,
            bids = agent.context.profile.domain_size(),
            "agent ready"
        );
        Ok(agent)
    }

    /// Handles one event, returning the action for a turn request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyDomain`] when asked to act in a domain
    /// without bids. Persistence failures at session end are not errors;
    /// they are reported through [`NegotiationAgent::save_outcome`].
    pub fn handle(&mut self, event: NegotiationEvent) -> Result<Option<Action>, AgentError> {
        if self.phase == AgentPhase::Ended {
            warn!(session = %self.context.session_id, ?event, "event after session end ignored");
            return Ok(None);
        }

        match event {
            NegotiationEvent::OfferReceived { from, bid } => {
                self.receive_offer(&from, bid);
                Ok(None)
            }
            NegotiationEvent::AcceptReceived { from, bid } => {
                self.identify(&from);
                self.learning.reach_agreement(&bid, true);
                Ok(None)
            }
            NegotiationEvent::TurnRequested => self.act().map(Some),
            NegotiationEvent::SessionEnded { agreement } => {
                self.end(agreement.as_ref());
                Ok(None)
            }
            NegotiationEvent::Other(kind) => {
                warn!(session = %self.context.session_id, kind = %kind, "ignoring unknown event");
                Ok(None)
            }
        }
    }

    fn receive_offer(&mut self, from: &str, bid: Bid) {
        self.identify(from);
        self.opponent.update(Some(&bid));
        self.bidding.received_bid(Some(&bid));
        self.learning.receive_bid(Some(&bid));
        debug!(
            session = %self.context.session_id,
            %bid,
            utility = self.context.profile.utility(&bid),
            "offer received"
        );
        self.last_received = Some(bid);
    }

    /// Fixes the counterpart on first contact and applies its history.
    fn identify(&mut self, from: &str) {
        if self.context.counterpart.is_none() {
            let counterpart = counterpart_identity(from).to_string();
            self.load_history(&counterpart);
            self.context.counterpart = Some(counterpart);
        }
    }

    fn load_history(&mut self, counterpart: &str) {
        let history = self.learning.load_data(counterpart, self.store.as_ref());
        self.bidding.update(history);
        self.acceptance.update(history);
    }

    fn act(&mut self) -> Result<Action, AgentError> {
        let offer = self
            .bidding
            .generate(&self.opponent)
            .ok_or(AgentError::EmptyDomain)?;

        if let Some(received) = self
            .last_received
            .as_ref()
            .filter(|received| self.acceptance.is_accepted(Some(*received), &offer))
        {
            info!(
                session = %self.context.session_id,
                mine = self.context.profile.utility(&offer),
                received = self.context.profile.utility(received),
                "accepting"
            );
            return Ok(Action::Accept(received.clone()));
        }

        debug!(
            session = %self.context.session_id,
            utility = self.context.profile.utility(&offer),
            "offering"
        );
        self.learning.save_bid(&offer);
        Ok(Action::Offer(offer))
    }

    fn end(&mut self, agreement: Option<&Bid>) {
        if let Some(bid) = agreement {
            if self.learning.agreement().is_none() {
                self.learning.reach_agreement(bid, false);
            }
        }
        self.phase = AgentPhase::Ended;

        let outcome = match self.learning.save_data(
            self.context.counterpart.as_deref(),
            &self.opponent,
            self.store.as_ref(),
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    session = %self.context.session_id,
                    counterpart = ?self.context.counterpart,
                    error = %e,
                    "failed to save concession history"
                );
                SaveOutcome::Failed(e.to_string())
            }
        };
        info!(
            session = %self.context.session_id,
            agreement = agreement.is_some(),
            saved = outcome.is_saved(),
            "session ended"
        );
        self.save_outcome = Some(outcome);
    }

    /// Session context, including the counterpart once known.
    #[must_use]
    pub const fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Counterpart identity, once known.
    #[must_use]
    pub fn counterpart(&self) -> Option<&str> {
        self.context.counterpart.as_deref()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> AgentPhase {
        self.phase
    }

    /// Result of persisting the session, once it has ended.
    #[must_use]
    pub const fn save_outcome(&self) -> Option<&SaveOutcome> {
        self.save_outcome.as_ref()
    }

    /// The counterpart's most recent offer.
    #[must_use]
    pub const fn last_received(&self) -> Option<&Bid> {
        self.last_received.as_ref()
    }

    /// Our own utility for `bid`.
    #[must_use]
    pub fn utility(&self, bid: &Bid) -> f64 {
        self.context.profile.utility(bid)
    }

    /// The opponent model.
    #[must_use]
    pub const fn opponent_model(&self) -> &OpponentModel {
        &self.opponent
    }

    /// The bidding strategy.
    #[must_use]
    pub const fn bidding(&self) -> &BiddingStrategy {
        &self.bidding
    }

    /// The acceptance strategy.
    #[must_use]
    pub const fn acceptance(&self) -> &AcceptanceStrategy {
        &self.acceptance
    }

    /// The learning model.
    #[must_use]
    pub const fn learning(&self) -> &LearningModel {
        &self.learning
    }
}
