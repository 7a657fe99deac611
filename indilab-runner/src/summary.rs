//! Aggregate result of a dispatch run.

use std::fmt;

use serde::Serialize;

use crate::pipeline::{InstrumentOutcome, InstrumentResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowTotals {
    pub written: usize,
    pub skipped: usize,
    pub missing: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub rows: RowTotals,
    /// One entry per instrument, in working-set order.
    pub instruments: Vec<InstrumentResult>,
}

impl RunSummary {
    pub fn from_results(instruments: Vec<InstrumentResult>) -> Self {
        let mut summary = RunSummary::default();
        for result in &instruments {
            match &result.outcome {
                InstrumentOutcome::Written { report, .. } => {
                    summary.processed += 1;
                    summary.rows.written += report.written;
                    summary.rows.skipped += report.skipped;
                    summary.rows.missing += report.missing;
                    summary.rows.failed += report.failed;
                }
                InstrumentOutcome::Skipped => summary.skipped += 1,
                InstrumentOutcome::Failed { .. } => summary.failed += 1,
                InstrumentOutcome::Cancelled => summary.cancelled += 1,
            }
        }
        summary.instruments = instruments;
        summary
    }

    pub fn total(&self) -> usize {
        self.instruments.len()
    }

    /// True when no instrument failed or was cancelled.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "instruments: {} processed, {} skipped, {} failed, {} cancelled (of {})",
            self.processed,
            self.skipped,
            self.failed,
            self.cancelled,
            self.total()
        )?;
        write!(
            f,
            "rows: {} written, {} below guard, {} missing key, {} write errors",
            self.rows.written, self.rows.skipped, self.rows.missing, self.rows.failed
        )?;
        for result in &self.instruments {
            if let InstrumentOutcome::Failed { .. } = result.outcome {
                write!(f, "\n  failed: {}", result.instrument)?;
            }
        }
        Ok(())
    }
}
