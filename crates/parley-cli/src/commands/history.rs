//! History command implementation.

use std::io::Write;
use std::path::PathBuf;

use parley_persist::{FileHistoryStore, HistoryStore};

use crate::error::CliError;
use crate::output::{HistoryReport, OutputFormat};

/// History command executor.
pub struct HistoryCommand {
    store: FileHistoryStore,
}

impl HistoryCommand {
    /// Create a history command reading from `store_dir`.
    #[must_use]
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: FileHistoryStore::new(store_dir),
        }
    }

    /// Execute the history command.
    ///
    /// # Errors
    ///
    /// Returns an error if the counterpart is blank or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        counterpart: &str,
    ) -> Result<(), CliError> {
        let report = self.report(counterpart)?;
        format.write(writer, &report)
    }

    /// Load the history of `counterpart`; unknown counterparts have none.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::InvalidArgument`] for a blank counterpart.
    pub fn report(&self, counterpart: &str) -> Result<HistoryReport, CliError> {
        if counterpart.trim().is_empty() {
            return Err(CliError::InvalidArgument("counterpart must not be empty".into()));
        }
        Ok(HistoryReport {
            counterpart: counterpart.to_string(),
            records: self.store.load(counterpart),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use parley_core::ConcessionRecord;

    fn record(p1: f64) -> ConcessionRecord {
        ConcessionRecord {
            p0: 1.0,
            p1,
            p2: 0.2,
            domain_size: 27,
            opponent_acceptance_time: None,
        }
    }

    #[test]
    fn reports_stored_records_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileHistoryStore::new(dir.path());
        store.store("boulware", &[record(0.5), record(0.55)]).expect("store");

        let report = HistoryCommand::new(dir.path()).report("boulware").expect("report");
        assert_eq!(report.records, vec![record(0.5), record(0.55)]);
    }

    #[test]
    fn unknown_counterpart_prints_empty_history() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = HistoryCommand::new(dir.path());
        let mut out = Vec::new();

        cmd.execute(&mut out, &OutputFormat::default(), "stranger")
            .expect("execute");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("No history for stranger"));
    }

    #[test]
    fn json_output_lists_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        FileHistoryStore::new(dir.path())
            .store("tft", &[record(0.4)])
            .expect("store");
        let mut out = Vec::new();

        HistoryCommand::new(dir.path())
            .execute(&mut out, &OutputFormat::new(Format::Json), "tft")
            .expect("execute");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["records"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn blank_counterpart_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = HistoryCommand::new(dir.path()).report("  ");
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }
}
