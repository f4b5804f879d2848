//! Session-scoped context shared by the agent's components.

use std::sync::Arc;

use parley_core::{ProgressClock, UtilitySpace};
use uuid::Uuid;

/// Everything one negotiation session hands to its agent.
///
/// Lives exactly as long as the session. The counterpart may be unknown at
/// construction and is then learned from the first offer received.
#[derive(Clone)]
pub struct SessionContext {
    /// Unique id of this session, used in logs.
    pub session_id: Uuid,
    /// Our private preferences.
    pub profile: Arc<dyn UtilitySpace>,
    /// Negotiation progress.
    pub clock: Arc<dyn ProgressClock>,
    /// Counterpart identity, if already known.
    pub counterpart: Option<String>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id)
            .field("domain", &self.profile.domain().name)
            .field("counterpart", &self.counterpart)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Creates a context with a fresh session id and no known counterpart.
    #[must_use]
    pub fn new(profile: Arc<dyn UtilitySpace>, clock: Arc<dyn ProgressClock>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            profile,
            clock,
            counterpart: None,
        }
    }

    /// Sets the counterpart identity up front.
    #[must_use]
    pub fn with_counterpart(mut self, counterpart: impl Into<String>) -> Self {
        self.counterpart = Some(counterpart.into());
        self
    }
}

/// Maps a party id to the identity its history is kept under.
///
/// Hosts number parties per session (`boulware_17`); the trailing
/// `_<digits>` instance suffix is dropped so every session with the same
/// kind of counterpart shares one history.
#[must_use]
pub fn counterpart_identity(party_id: &str) -> &str {
    match party_id.rsplit_once('_') {
        Some((name, suffix))
            if !name.is_empty()
                && !suffix.is_empty()
                && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => party_id,
    }
}
