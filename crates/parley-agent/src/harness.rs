//! Local alternating-offers session between two agents.
//!
//! Stands in for a host protocol when simulating or testing: the agents
//! take turns, every offer is delivered to the other side, and the session
//! ends on the first accept or when the round clock reaches its deadline.

use parley_core::{Bid, ProgressClock, RoundClock};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::{Action, NegotiationAgent, NegotiationEvent};
use crate::error::AgentError;
use crate::learning::SaveOutcome;

/// How a simulated session ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// The agreed bid, if any.
    pub agreement: Option<Bid>,
    /// Party id of the agent that accepted.
    pub accepted_by: Option<String>,
    /// Turns taken, accepts included.
    pub turns: u64,
    /// Persistence result of the first and second agent.
    pub saves: [Option<SaveOutcome>; 2],
}

impl SessionOutcome {
    /// Returns true if the session reached an agreement.
    #[must_use]
    pub const fn is_agreement(&self) -> bool {
        self.agreement.is_some()
    }
}

/// Runs one session; `first` opens.
///
/// Both agents must share `clock` through their session contexts. The clock
/// advances one round per offer.
///
/// # Errors
///
/// Propagates the first error either agent returns.
pub fn run_alternating(
    first: &mut NegotiationAgent,
    second: &mut NegotiationAgent,
    ids: [&str; 2],
    clock: &RoundClock,
) -> Result<SessionOutcome, AgentError> {
    let mut agents = [first, second];
    let mut agreement = None;
    let mut accepted_by = None;
    let mut turns = 0u64;

    while !clock.is_past_deadline() {
        let me = usize::from(turns % 2 == 1);
        let other = 1 - me;
        let from = ids[me].to_string();
        turns += 1;

        match agents[me].handle(NegotiationEvent::TurnRequested)? {
            Some(Action::Offer(bid)) => {
                agents[other].handle(NegotiationEvent::OfferReceived { from, bid })?;
                clock.advance();
            }
            Some(Action::Accept(bid)) => {
                agents[other].handle(NegotiationEvent::AcceptReceived {
                    from: from.clone(),
                    bid: bid.clone(),
                })?;
                agreement = Some(bid);
                accepted_by = Some(from);
                break;
            }
            None => break,
        }
    }

    for agent in &mut agents {
        agent.handle(NegotiationEvent::SessionEnded {
            agreement: agreement.clone(),
        })?;
    }

    info!(
        turns,
        agreement = agreement.is_some(),
        accepted_by = ?accepted_by,
        "session finished"
    );
    Ok(SessionOutcome {
        agreement,
        accepted_by,
        turns,
        saves: [
            agents[0].save_outcome().cloned(),
            agents[1].save_outcome().cloned(),
        ],
    })
}
