// ============================================================
// Layer 3 - Run Errors
// ============================================================
// Every condition that can stop a run. None of them is retried:
// the run halts and the error is logged with the input that
// caused it.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse grouping used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Resolution,
    DataLoad,
    Directory,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unknown task '{task_name}' (known tasks: {known})")]
    UnknownTask { task_name: String, known: String },

    #[error("no tokenizer matched vocabulary directory '{}'", vocab_dir.display())]
    NoTokenizerMatched { vocab_dir: PathBuf },

    #[error("cannot load tokenizer from '{}': {reason}", path.display())]
    TokenizerLoad { path: PathBuf, reason: String },

    #[error("cannot load data from '{}': {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error("cannot prepare result directory '{}'", path.display())]
    Directory {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write run manifest '{}': {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
}

impl RunError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        RunError::Configuration(msg.into())
    }

    pub fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RunError::DataLoad {
            path:   path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Configuration(_) => ErrorKind::Configuration,
            RunError::UnknownTask { .. }
            | RunError::NoTokenizerMatched { .. }
            | RunError::TokenizerLoad { .. } => ErrorKind::Resolution,
            RunError::DataLoad { .. } => ErrorKind::DataLoad,
            RunError::Directory { .. } | RunError::Manifest { .. } => ErrorKind::Directory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let unknown = RunError::UnknownTask {
            task_name: "NotARealTask".into(),
            known:     String::new(),
        };
        assert_eq!(unknown.kind(), ErrorKind::Resolution);
        assert_eq!(RunError::data_load("x.jsonl", "missing").kind(), ErrorKind::DataLoad);
        assert_eq!(RunError::configuration("bad").kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_message_names_failing_input() {
        let err = RunError::NoTokenizerMatched {
            vocab_dir: PathBuf::from("/models/xlnet-base"),
        };
        assert!(err.to_string().contains("/models/xlnet-base"));
    }
}
