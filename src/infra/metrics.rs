// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records the loss history to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: summed training ELBO loss / training examples
//   - val_loss:   summed validation ELBO loss / validation examples
//
// Output file: <output_dir>/loss_history.csv
//
// Example CSV output:
//   epoch,train_loss,val_loss
//   1,312.418213,298.004517
//   2,241.772705,236.118896
//
// The file is recreated when a run starts, so it only ever holds
// the epochs of one run.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::history::LossHistory;

const HEADER: &str = "epoch,train_loss,val_loss";

/// One row of the loss history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss }
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the CSV (truncating any previous run) and write the header.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("loss_history.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{HEADER}")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.val_loss)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    /// Rewrite the whole file from an in-memory history.
    pub fn write_history(&self, history: &LossHistory) -> Result<()> {
        let mut out = String::from(HEADER);
        out.push('\n');
        for (i, (t, v)) in history.train().iter().zip(history.val()).enumerate() {
            out.push_str(&format!("{},{:.6},{:.6}\n", i + 1, t, v));
        }
        fs::write(&self.csv_path, out)
            .with_context(|| format!("Cannot write '{}'", self.csv_path.display()))
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended_in_order() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::create(tmp.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 10.0, 11.0)).unwrap();
        logger.log(&EpochMetrics::new(2, 9.5, 10.25)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![HEADER, "1,10.000000,11.000000", "2,9.500000,10.250000"]);
    }

    #[test]
    fn test_create_truncates_previous_run() {
        let tmp = tempfile::tempdir().unwrap();
        MetricsLogger::create(tmp.path()).unwrap()
            .log(&EpochMetrics::new(1, 1.0, 1.0)).unwrap();

        let logger = MetricsLogger::create(tmp.path()).unwrap();
        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_write_history() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::create(tmp.path()).unwrap();
        let mut h  = LossHistory::new();
        h.push_train(4.0);
        h.push_val(5.0);
        logger.write_history(&h).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text, format!("{HEADER}\n1,4.000000,5.000000\n"));
    }
}
