//! Simulate command implementation.
//!
//! Runs one alternating-offers session between two agents built from
//! profile files, over a round-limited deadline. Each party is identified
//! as `<profile name>_1`, so repeated simulations with a file store build
//! up each side's history of the other.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parley_agent::{run_alternating, AgentConfig, NegotiationAgent, SessionContext};
use parley_core::{
    LinearAdditiveProfile, LinearAdditiveUtilitySpace, ProgressClock, RoundClock, UtilitySpace,
};
use parley_persist::{FileHistoryStore, HistoryStore, MemoryHistoryStore};
use tracing::info;

use crate::cli::SimulateArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, PartyReport, SimulationReport};

/// Simulate command executor.
pub struct SimulateCommand {
    store: Arc<dyn HistoryStore>,
    config: AgentConfig,
}

impl SimulateCommand {
    /// Create a simulate command from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent configuration cannot be loaded.
    pub fn from_args(args: &SimulateArgs) -> Result<Self, CliError> {
        let config = match &args.config {
            Some(path) => AgentConfig::from_file(path)?,
            None => AgentConfig::default(),
        };
        Ok(Self::new(args.store.clone(), config))
    }

    /// Create a simulate command; without a store directory histories are
    /// kept in memory for the duration of the command.
    #[must_use]
    pub fn new(store_dir: Option<PathBuf>, config: AgentConfig) -> Self {
        let store: Arc<dyn HistoryStore> = match store_dir {
            Some(dir) => Arc::new(FileHistoryStore::new(dir)),
            None => Arc::new(MemoryHistoryStore::new()),
        };
        Self { store, config }
    }

    /// Execute the simulate command.
    ///
    /// # Errors
    ///
    /// Returns an error if a profile cannot be loaded, the profiles disagree
    /// on the domain, or an agent fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        profile_a: &Path,
        profile_b: &Path,
        rounds: u64,
    ) -> Result<(), CliError> {
        let report = self.run(profile_a, profile_b, rounds)?;
        format.write(writer, &report)
    }

    /// Run the session and summarise it.
    ///
    /// # Errors
    ///
    /// See [`SimulateCommand::execute`].
    pub fn run(
        &self,
        profile_a: &Path,
        profile_b: &Path,
        rounds: u64,
    ) -> Result<SimulationReport, CliError> {
        if rounds == 0 {
            return Err(CliError::InvalidArgument("rounds must be at least 1".into()));
        }
        let space_a = load_profile(profile_a)?;
        let space_b = load_profile(profile_b)?;
        if space_a.domain() != space_b.domain() {
            return Err(CliError::InvalidArgument(format!(
                "profiles use different domains: '{}' and '{}'",
                space_a.domain().name,
                space_b.domain().name
            )));
        }

        let id_a = party_id(&space_a, "a");
        let id_b = party_id(&space_b, "b");
        let space_a = Arc::new(space_a);
        let space_b = Arc::new(space_b);
        let clock = Arc::new(RoundClock::new(rounds));

        let mut agent_a = self.agent(Arc::clone(&space_a), &clock)?;
        let mut agent_b = self.agent(Arc::clone(&space_b), &clock)?;
        info!(%id_a, %id_b, rounds, "starting simulation");

        let outcome = run_alternating(
            &mut agent_a,
            &mut agent_b,
            [id_a.as_str(), id_b.as_str()],
            &clock,
        )?;
        let [save_a, save_b] = outcome.saves;
        let utility = |space: &LinearAdditiveUtilitySpace| {
            outcome.agreement.as_ref().map(|bid| space.utility(bid))
        };

        Ok(SimulationReport {
            rounds,
            turns: outcome.turns,
            party_a: PartyReport {
                id: id_a,
                utility: utility(space_a.as_ref()),
                save: save_a,
            },
            party_b: PartyReport {
                id: id_b,
                utility: utility(space_b.as_ref()),
                save: save_b,
            },
            agreement: outcome.agreement,
            accepted_by: outcome.accepted_by,
        })
    }

    fn agent(
        &self,
        space: Arc<LinearAdditiveUtilitySpace>,
        clock: &Arc<RoundClock>,
    ) -> Result<NegotiationAgent, CliError> {
        let context = SessionContext::new(space, Arc::clone(clock) as Arc<dyn ProgressClock>);
        Ok(NegotiationAgent::new(
            context,
            self.config.clone(),
            Arc::clone(&self.store),
        )?)
    }
}

fn load_profile(path: &Path) -> Result<LinearAdditiveUtilitySpace, CliError> {
    let profile = LinearAdditiveProfile::from_file(path)?;
    Ok(LinearAdditiveUtilitySpace::new(profile)?)
}

fn party_id(space: &LinearAdditiveUtilitySpace, fallback: &str) -> String {
    let name = space.name().trim();
    let name = if name.is_empty() { fallback } else { name };
    format!("{name}_1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;

    const SELLER: &str = r#"{
        "name": "seller",
        "domain": {"name": "deal", "issues": [
            {"name": "price", "values": ["low", "mid", "high"]},
            {"name": "delivery", "values": ["low", "mid", "high"]}
        ]},
        "issue_weights": {"price": 0.5, "delivery": 0.5},
        "value_utilities": {
            "price": {"low": 0.0, "mid": 0.5, "high": 1.0},
            "delivery": {"low": 0.0, "mid": 0.5, "high": 1.0}
        }
    }"#;

    const BUYER: &str = r#"{
        "name": "buyer",
        "domain": {"name": "deal", "issues": [
            {"name": "price", "values": ["low", "mid", "high"]},
            {"name": "delivery", "values": ["low", "mid", "high"]}
        ]},
        "issue_weights": {"price": 0.5, "delivery": 0.5},
        "value_utilities": {
            "price": {"low": 1.0, "mid": 0.5, "high": 0.0},
            "delivery": {"low": 1.0, "mid": 0.5, "high": 0.0}
        }
    }"#;

    fn write_profiles(dir: &Path) -> (PathBuf, PathBuf) {
        let a = dir.join("seller.json");
        let b = dir.join("buyer.json");
        std::fs::write(&a, SELLER).expect("write seller");
        std::fs::write(&b, BUYER).expect("write buyer");
        (a, b)
    }

    #[test]
    fn simulation_reaches_even_split() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (a, b) = write_profiles(dir.path());

        let report = SimulateCommand::new(None, AgentConfig::default())
            .run(&a, &b, 60)
            .expect("run");

        assert!(report.agreement.is_some());
        assert_eq!(report.party_a.id, "seller_1");
        assert_eq!(report.party_b.id, "buyer_1");
        let ua = report.party_a.utility.expect("utility a");
        let ub = report.party_b.utility.expect("utility b");
        assert!((ua - 0.5).abs() < 1e-9);
        assert!((ub - 0.5).abs() < 1e-9);
    }

    #[test]
    fn simulation_persists_both_histories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (a, b) = write_profiles(dir.path());
        let store_dir = dir.path().join("history");
        let cmd = SimulateCommand::new(Some(store_dir.clone()), AgentConfig::default());

        cmd.run(&a, &b, 60).expect("first run");
        cmd.run(&a, &b, 60).expect("second run");

        let store = FileHistoryStore::new(store_dir);
        assert_eq!(store.load("buyer").len(), 2);
        assert_eq!(store.load("seller").len(), 2);
    }

    #[test]
    fn json_output_is_valid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (a, b) = write_profiles(dir.path());
        let mut out = Vec::new();

        SimulateCommand::new(None, AgentConfig::default())
            .execute(&mut out, &OutputFormat::new(Format::Json), &a, &b, 30)
            .expect("execute");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["rounds"], 30);
        assert_eq!(value["party_a"]["id"], "seller_1");
    }

    #[test]
    fn mismatched_domains_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (a, _) = write_profiles(dir.path());
        let other = dir.path().join("other.json");
        std::fs::write(&other, SELLER.replace("\"deal\"", "\"other\"")).expect("write");

        let result = SimulateCommand::new(None, AgentConfig::default()).run(&a, &other, 10);
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn zero_rounds_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (a, b) = write_profiles(dir.path());
        let result = SimulateCommand::new(None, AgentConfig::default()).run(&a, &b, 0);
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn missing_profile_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (a, _) = write_profiles(dir.path());
        let result = SimulateCommand::new(None, AgentConfig::default())
            .run(&a, &dir.path().join("absent.json"), 10);
        assert!(matches!(result, Err(CliError::Profile(_))));
    }
}
