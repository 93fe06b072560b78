// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one row per training epoch to <result_dir>/metrics.csv
// and dumps evaluation summaries as JSON.
//
//   epoch,train_loss,dev_loss,dev_acc
//   1,1.604100,1.598200,0.214000
//   2,1.551300,1.572900,0.263000

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

pub const EVAL_RESULT_FILE: &str = "eval_result.json";

/// Loss and accuracy over one pass of a split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    pub loss:     f64,
    pub accuracy: f64,
    pub examples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub dev:        EvalSummary,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, dev: EvalSummary) -> Self {
        Self { epoch, train_loss, dev }
    }

    /// Dev accuracy beats the best seen so far.
    pub fn is_improvement(&self, best_dev_acc: f64) -> bool {
        self.dev.accuracy > best_dev_acc
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header unless the file already exists.
    pub fn new(dir: &Path) -> Result<Self> {
        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,dev_loss,dev_acc")?;
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.dev.loss, m.dev.accuracy,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Write an evaluation summary next to the run's other artifacts.
pub fn dump_eval_result(dir: &Path, summary: &EvalSummary) -> Result<PathBuf> {
    let path = dir.join(EVAL_RESULT_FILE);
    fs::write(&path, serde_json::to_string_pretty(summary)?)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(acc: f64) -> EvalSummary {
        EvalSummary { loss: 1.5, accuracy: acc, examples: 10 }
    }

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 1.6, summary(0.4));
        assert!(m.is_improvement(0.3));
        assert!(!m.is_improvement(0.4));
    }

    #[test]
    fn test_csv_rows_append() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 1.6, summary(0.2))).unwrap();

        // a second logger on the same dir keeps the existing rows
        let logger = MetricsLogger::new(tmp.path()).unwrap();
        logger.log(&EpochMetrics::new(2, 1.5, summary(0.3))).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,dev_loss,dev_acc");
        assert_eq!(lines[1], "1,1.600000,1.500000,0.200000");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_dump_eval_result() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = dump_eval_result(tmp.path(), &summary(0.5)).unwrap();
        let back: EvalSummary = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, summary(0.5));
    }
}
