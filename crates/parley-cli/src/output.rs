//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use parley_agent::SaveOutcome;
use parley_core::{Bid, ConcessionRecord};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Persisted history of one counterpart.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    /// Counterpart identity.
    pub counterpart: String,
    /// Records, oldest first.
    pub records: Vec<ConcessionRecord>,
}

impl TableDisplay for HistoryReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.records.is_empty() {
            writeln!(writer, "No history for {}", self.counterpart)?;
            return Ok(());
        }

        writeln!(writer, "History: {}", self.counterpart)?;
        writeln!(
            writer,
            "{:>4}  {:>7}  {:>7}  {:>7}  {:>8}  {:>11}",
            "#", "P0", "P1", "P2", "BIDS", "ACCEPTED AT"
        )?;
        writeln!(writer, "{}", "─".repeat(54))?;

        for (i, record) in self.records.iter().enumerate() {
            let accepted = record
                .opponent_acceptance_time
                .map_or_else(|| "-".to_string(), |t| format!("{t:.3}"));
            writeln!(
                writer,
                "{:>4}  {:>7.4}  {:>7.4}  {:>7.4}  {:>8}  {:>11}",
                i + 1,
                record.p0,
                record.p1,
                record.p2,
                record.domain_size,
                accepted
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} session(s)", self.records.len())?;
        Ok(())
    }
}

/// One side of a simulated session.
#[derive(Debug, Clone, Serialize)]
pub struct PartyReport {
    /// Party id used in the session.
    pub id: String,
    /// The party's utility for the agreement, if any.
    pub utility: Option<f64>,
    /// What happened to the party's history.
    pub save: Option<SaveOutcome>,
}

/// Result of a simulated session.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Offer budget.
    pub rounds: u64,
    /// Turns actually taken.
    pub turns: u64,
    /// The agreed bid, if any.
    pub agreement: Option<Bid>,
    /// Party that accepted.
    pub accepted_by: Option<String>,
    /// Opening agent.
    pub party_a: PartyReport,
    /// Responding agent.
    pub party_b: PartyReport,
}

impl TableDisplay for SimulationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Simulation")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Turns:            {} / {}", self.turns, self.rounds)?;
        match (&self.agreement, &self.accepted_by) {
            (Some(bid), Some(by)) => {
                writeln!(writer, "Agreement:        {bid}")?;
                writeln!(writer, "Accepted by:      {by}")?;
            }
            (Some(bid), None) => writeln!(writer, "Agreement:        {bid}")?,
            (None, _) => writeln!(writer, "Agreement:        none")?,
        }
        for party in [&self.party_a, &self.party_b] {
            writeln!(writer)?;
            writeln!(writer, "{}", party.id)?;
            if let Some(u) = party.utility {
                writeln!(writer, "  Utility:        {u:.4}")?;
            }
            writeln!(writer, "  History:        {}", describe_save(party.save.as_ref()))?;
        }
        Ok(())
    }
}

fn describe_save(save: Option<&SaveOutcome>) -> String {
    match save {
        Some(SaveOutcome::Saved(r)) => {
            format!("saved (p0={:.3}, p1={:.3}, p2={:.3})", r.p0, r.p1, r.p2)
        }
        Some(SaveOutcome::Skipped(reason)) => format!("skipped: {reason}"),
        Some(SaveOutcome::Failed(e)) => format!("failed: {e}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_agent::SkipReason;

    fn record(accepted: Option<f64>) -> ConcessionRecord {
        ConcessionRecord {
            p0: 0.9,
            p1: 0.6,
            p2: 0.3,
            domain_size: 9,
            opponent_acceptance_time: accepted,
        }
    }

    fn simulation(agreement: Option<Bid>) -> SimulationReport {
        SimulationReport {
            rounds: 40,
            turns: 17,
            accepted_by: agreement.as_ref().map(|_| "buyer_1".to_string()),
            agreement,
            party_a: PartyReport {
                id: "seller_1".into(),
                utility: Some(0.5),
                save: Some(SaveOutcome::Saved(record(None))),
            },
            party_b: PartyReport {
                id: "buyer_1".into(),
                utility: Some(0.5),
                save: Some(SaveOutcome::Skipped(SkipReason::InsufficientOffers)),
            },
        }
    }

    #[test]
    fn output_format_default_is_table() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt.format(), Format::Table);
        assert!(!fmt.is_json());
    }

    #[test]
    fn output_format_json() {
        let fmt = OutputFormat::new(Format::Json);
        assert_eq!(fmt.format(), Format::Json);
        assert!(fmt.is_json());
    }

    #[test]
    fn history_empty() {
        let report = HistoryReport {
            counterpart: "tft".into(),
            records: vec![],
        };
        let output = OutputFormat::default().to_string(&report).expect("should format");
        assert!(output.contains("No history for tft"));
    }

    #[test]
    fn history_table_output() {
        let report = HistoryReport {
            counterpart: "boulware".into(),
            records: vec![record(None), record(Some(0.75))],
        };
        let output = OutputFormat::default().to_string(&report).expect("should format");

        assert!(output.contains("History: boulware"));
        assert!(output.contains("0.9000"));
        assert!(output.contains("0.750"));
        assert!(output.contains("Total: 2 session(s)"));
    }

    #[test]
    fn history_json_output() {
        let report = HistoryReport {
            counterpart: "boulware".into(),
            records: vec![record(Some(0.5))],
        };
        let output = OutputFormat::new(Format::Json)
            .to_string(&report)
            .expect("should format");
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(value["counterpart"], "boulware");
        assert_eq!(value["records"][0]["domain_size"], 9);
        assert_eq!(value["records"][0]["opponent_acceptance_time"], 0.5);
    }

    #[test]
    fn simulation_table_with_agreement() {
        let bid = Bid::new([("price", "mid")]);
        let output = OutputFormat::default()
            .to_string(&simulation(Some(bid)))
            .expect("should format");

        assert!(output.contains("Turns:            17 / 40"));
        assert!(output.contains("Agreement:        {price=mid}"));
        assert!(output.contains("Accepted by:      buyer_1"));
        assert!(output.contains("saved (p0=0.900, p1=0.600, p2=0.300)"));
        assert!(output.contains("skipped: insufficient offers"));
    }

    #[test]
    fn simulation_table_without_agreement() {
        let output = OutputFormat::default()
            .to_string(&simulation(None))
            .expect("should format");
        assert!(output.contains("Agreement:        none"));
        assert!(!output.contains("Accepted by"));
    }
}
