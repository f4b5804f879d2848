//! Component configuration.
//!
//! Every tunable of the decision engine is a named field with a documented
//! default. [`AgentConfig`] bundles the four component configs and can be
//! read from a (possibly partial) JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Opponent model tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentModelConfig {
    /// Base additive boost for an issue that stayed stable while the
    /// counterpart conceded elsewhere.
    pub alpha: f64,
    /// Decay exponent of the boost over time: `alpha * (1 - t^beta)`.
    pub beta: f64,
    /// Exponent applied to value occurrence counts, in `(0, 1)`.
    pub gamma: f64,
    /// Number of offers per comparison window.
    pub window_size: usize,
    /// p-value above which an issue's value distribution counts as unchanged.
    pub significance: f64,
}

impl Default for OpponentModelConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            beta: 5.0,
            gamma: 0.25,
            window_size: 5,
            significance: 0.05,
        }
    }
}

impl OpponentModelConfig {
    /// Sets the comparison window size.
    #[must_use]
    pub const fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Sets the count exponent.
    #[must_use]
    pub const fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }
}

/// Bidding strategy tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiddingConfig {
    /// Opening utility before it is capped by the domain maximum.
    pub p0: f64,
    /// Initial curve shape control point; re-derived by `update`.
    pub p1: f64,
    /// Floor utility before it is raised by the domain minimum and reservation value.
    pub p2: f64,
    /// Tit-for-tat reciprocation factor.
    pub p3: f64,
    /// Tolerance below the target utility when collecting candidates.
    pub window_lower: f64,
    /// Tolerance above the target utility when collecting candidates.
    pub window_upper: f64,
    /// Two learned `p1` values closer than this count as converged.
    pub epsilon: f64,
    /// `p1 = (p0 + p2) * p1_ratio` before learned adjustments.
    pub p1_ratio: f64,
    /// Number of recent own offers a new offer must differ from.
    pub repetition_window: usize,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            p0: 1.0,
            p1: 0.7,
            p2: 0.4,
            p3: 0.5,
            window_lower: 0.02,
            window_upper: 0.02,
            epsilon: 0.05,
            p1_ratio: 0.6,
            repetition_window: 5,
        }
    }
}

impl BiddingConfig {
    /// Sets the floor utility.
    #[must_use]
    pub const fn with_floor(mut self, p2: f64) -> Self {
        self.p2 = p2;
        self
    }

    /// Sets the candidate tolerance window.
    #[must_use]
    pub const fn with_window(mut self, lower: f64, upper: f64) -> Self {
        self.window_lower = lower;
        self.window_upper = upper;
        self
    }
}

/// Acceptance strategy tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceConfig {
    /// Utility below which nothing is accepted, before learning.
    pub floor: f64,
    /// Two learned floors closer than this count as stable.
    pub epsilon: f64,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            floor: 0.0,
            epsilon: 0.05,
        }
    }
}

/// Learning model tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Received offers required before a session is distilled and persisted.
    pub min_offers: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self { min_offers: 2 }
    }
}

/// Configuration of a whole negotiation agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Opponent model settings.
    pub opponent: OpponentModelConfig,
    /// Bidding strategy settings.
    pub bidding: BiddingConfig,
    /// Acceptance strategy settings.
    pub acceptance: AcceptanceConfig,
    /// Learning model settings.
    pub learning: LearningConfig,
}

impl AgentConfig {
    /// Reads a configuration from a JSON file; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// [`AgentConfig::validate`].
    pub fn from_file(path: &Path) -> Result<Self, AgentError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field is within its meaningful range.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), AgentError> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(AgentError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {v}"
                )))
            }
        };

        let o = &self.opponent;
        unit("opponent.alpha", o.alpha)?;
        unit("opponent.significance", o.significance)?;
        if !(o.gamma > 0.0 && o.gamma < 1.0) {
            return Err(AgentError::InvalidConfig(format!(
                "opponent.gamma must be within (0, 1), got {}",
                o.gamma
            )));
        }
        if o.beta <= 0.0 {
            return Err(AgentError::InvalidConfig(format!(
                "opponent.beta must be positive, got {}",
                o.beta
            )));
        }
        if o.window_size == 0 {
            return Err(AgentError::InvalidConfig(
                "opponent.window_size must be at least 1".into(),
            ));
        }

        let b = &self.bidding;
        unit("bidding.p0", b.p0)?;
        unit("bidding.p1", b.p1)?;
        unit("bidding.p2", b.p2)?;
        unit("bidding.p3", b.p3)?;
        unit("bidding.window_lower", b.window_lower)?;
        unit("bidding.window_upper", b.window_upper)?;
        unit("bidding.epsilon", b.epsilon)?;
        if b.p2 > b.p0 {
            return Err(AgentError::InvalidConfig(format!(
                "bidding.p2 ({}) must not exceed bidding.p0 ({})",
                b.p2, b.p0
            )));
        }
        if b.p1_ratio <= 0.0 {
            return Err(AgentError::InvalidConfig(format!(
                "bidding.p1_ratio must be positive, got {}",
                b.p1_ratio
            )));
        }

        unit("acceptance.floor", self.acceptance.floor)?;
        unit("acceptance.epsilon", self.acceptance.epsilon)?;

        if self.learning.min_offers < 2 {
            return Err(AgentError::InvalidConfig(
                "learning.min_offers must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults_are_valid() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: AgentConfig =
            serde_json::from_str(r#"{"bidding":{"p2":0.6},"opponent":{"window_size":3}}"#).unwrap();
        assert!((config.bidding.p2 - 0.6).abs() < f64::EPSILON);
        assert!((config.bidding.p0 - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.opponent.window_size, 3);
        assert!((config.opponent.gamma - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.learning.min_offers, 2);
    }

    #[test]
    fn from_file_reads_and_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("agent.json");
        std::fs::write(&path, r#"{"acceptance":{"floor":0.3}}"#).expect("write");
        let config = AgentConfig::from_file(&path).expect("load");
        assert!((config.acceptance.floor - 0.3).abs() < f64::EPSILON);

        std::fs::write(&path, r#"{"acceptance":{"floor":3.0}}"#).expect("write");
        assert!(matches!(
            AgentConfig::from_file(&path),
            Err(AgentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            AgentConfig::from_file(&dir.path().join("absent.json")),
            Err(AgentError::Io(_))
        ));
    }

    #[test_case(|c: &mut AgentConfig| c.opponent.gamma = 1.0 ; "gamma at one")]
    #[test_case(|c: &mut AgentConfig| c.opponent.window_size = 0 ; "empty window")]
    #[test_case(|c: &mut AgentConfig| c.opponent.beta = 0.0 ; "zero beta")]
    #[test_case(|c: &mut AgentConfig| c.bidding.p0 = 0.3 ; "floor above opening")]
    #[test_case(|c: &mut AgentConfig| c.bidding.p3 = -0.1 ; "negative reciprocation")]
    #[test_case(|c: &mut AgentConfig| c.learning.min_offers = 1 ; "single offer fit")]
    fn invalid_configs_are_rejected(mutate: fn(&mut AgentConfig)) {
        let mut config = AgentConfig::default();
        mutate(&mut config);
        assert!(matches!(config.validate(), Err(AgentError::InvalidConfig(_))));
    }

    #[test]
    fn builders_set_fields() {
        let bidding = BiddingConfig::default().with_floor(0.8).with_window(0.05, 0.01);
        assert!((bidding.p2 - 0.8).abs() < f64::EPSILON);
        assert!((bidding.window_lower - 0.05).abs() < f64::EPSILON);
        assert!((bidding.window_upper - 0.01).abs() < f64::EPSILON);

        let opponent = OpponentModelConfig::default().with_window_size(3).with_gamma(0.5);
        assert_eq!(opponent.window_size, 3);
        assert!((opponent.gamma - 0.5).abs() < f64::EPSILON);
    }
}
