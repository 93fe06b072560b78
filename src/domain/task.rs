// ============================================================
// Layer 3 - Task Registry
// ============================================================
// A task identifier follows the convention
//
//     <DataSource>_<PTM>_<ModelVariant>
//
// e.g. "OMCS_Albert_Baseline" = OMCS data processor, ALBERT
// encoder, baseline scoring head.
//
// The registry is a fixed table. Adding a task is one new row
// in TASK_TABLE; nothing else has to change.
//
// The tokenizer family is not part of the identifier: it comes
// from the vocabulary directory (see TokenizerFamily::detect).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::error::RunError;

// ─── Tokenizer families ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenizerFamily {
    Albert,
    Bert,
}

impl TokenizerFamily {
    /// Detection order matters: every ALBERT path also contains "bert".
    const PRIORITY: [TokenizerFamily; 2] = [TokenizerFamily::Albert, TokenizerFamily::Bert];

    /// Substring that identifies the family inside a vocabulary path.
    pub fn marker(&self) -> &'static str {
        match self {
            TokenizerFamily::Albert => "albert",
            TokenizerFamily::Bert   => "bert",
        }
    }

    /// Return the first family whose marker appears in `vocab_dir`.
    pub fn detect(vocab_dir: &Path) -> Option<Self> {
        let path = vocab_dir.to_string_lossy();
        Self::PRIORITY
            .into_iter()
            .find(|family| path.contains(family.marker()))
    }

    pub fn cls_token(&self) -> &'static str {
        "[CLS]"
    }

    pub fn sep_token(&self) -> &'static str {
        "[SEP]"
    }

    pub fn pad_token(&self) -> &'static str {
        match self {
            TokenizerFamily::Albert => "<pad>",
            TokenizerFamily::Bert   => "[PAD]",
        }
    }
}

// ─── Model architectures and data processors ─────────────────────────────────

/// Scoring head placed on top of the pretrained encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelArchitecture {
    /// Attention-weighted merge of the token states.
    AlbertCsqa,
    /// Linear scorer over the [CLS] state.
    AlbertBaseline,
    /// Extra transformer layer, then attention merge.
    AlbertAddTfm,
    /// Attention ranker combining [CLS] with the best-attended tokens.
    BertAttRanker,
}

/// How raw records are read and turned into features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessorKind {
    /// Plain CommonsenseQA questions.
    Baseline,
    /// Questions whose choices carry OMCS supporting sentences.
    Omcs,
}

/// A fully resolved task: everything needed to build the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub tokenizer:    TokenizerFamily,
    pub architecture: ModelArchitecture,
    pub processor:    ProcessorKind,
}

// ─── Registry ────────────────────────────────────────────────────────────────

pub const TASK_TABLE: &[(&str, ModelArchitecture, ProcessorKind)] = &[
    ("Origin_Albert_AttnMerge",       ModelArchitecture::AlbertCsqa,     ProcessorKind::Baseline),
    ("Origin_Albert_Baseline",        ModelArchitecture::AlbertBaseline, ProcessorKind::Baseline),
    ("Origin_Albert_AttnMergeAddTFM", ModelArchitecture::AlbertAddTfm,   ProcessorKind::Baseline),
    ("OMCS_Bert_AttRanker",           ModelArchitecture::BertAttRanker,  ProcessorKind::Omcs),
    ("OMCS_Albert_Baseline",          ModelArchitecture::AlbertBaseline, ProcessorKind::Omcs),
];

/// Exact-match lookup of a task identifier.
pub fn lookup_task(task_name: &str) -> Option<(ModelArchitecture, ProcessorKind)> {
    TASK_TABLE
        .iter()
        .find(|(name, _, _)| *name == task_name)
        .map(|&(_, architecture, processor)| (architecture, processor))
}

/// Names of every registered task, for error messages and `--help`.
pub fn known_tasks() -> impl Iterator<Item = &'static str> {
    TASK_TABLE.iter().map(|(name, _, _)| *name)
}

impl TaskDescriptor {
    /// Tokenizer family from the vocabulary path, then the registry
    /// lookup. Either miss is a resolution error.
    pub fn resolve(task_name: &str, vocab_dir: &Path) -> Result<Self, RunError> {
        let tokenizer = TokenizerFamily::detect(vocab_dir).ok_or_else(|| {
            RunError::NoTokenizerMatched { vocab_dir: vocab_dir.to_path_buf() }
        })?;
        let (architecture, processor) = lookup_task(task_name).ok_or_else(|| {
            RunError::UnknownTask {
                task_name: task_name.to_string(),
                known:     known_tasks().collect::<Vec<_>>().join(", "),
            }
        })?;
        Ok(Self { tokenizer, architecture, processor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_every_registered_task_resolves() {
        for name in known_tasks() {
            assert!(lookup_task(name).is_some(), "{name} did not resolve");
        }
    }

    #[test]
    fn test_registry_pairs() {
        assert_eq!(
            lookup_task("OMCS_Bert_AttRanker"),
            Some((ModelArchitecture::BertAttRanker, ProcessorKind::Omcs))
        );
        assert_eq!(
            lookup_task("Origin_Albert_Baseline"),
            Some((ModelArchitecture::AlbertBaseline, ProcessorKind::Baseline))
        );
    }

    #[test]
    fn test_unknown_task_has_no_match() {
        assert_eq!(lookup_task("NotARealTask"), None);
        // exact match only, no prefix or case folding
        assert_eq!(lookup_task("omcs_albert_baseline"), None);
        assert_eq!(lookup_task("OMCS_Albert_Baseline "), None);
    }

    #[test]
    fn test_albert_wins_over_bert() {
        let path = PathBuf::from("/models/albert-base-v2");
        assert_eq!(TokenizerFamily::detect(&path), Some(TokenizerFamily::Albert));
    }

    #[test]
    fn test_bert_detected() {
        let path = PathBuf::from("/models/bert-base-uncased");
        assert_eq!(TokenizerFamily::detect(&path), Some(TokenizerFamily::Bert));
    }

    #[test]
    fn test_substring_match_is_not_word_aware() {
        // "roberta" contains "bert"
        let path = PathBuf::from("/models/roberta-large");
        assert_eq!(TokenizerFamily::detect(&path), Some(TokenizerFamily::Bert));
    }

    #[test]
    fn test_no_family_matched() {
        assert_eq!(TokenizerFamily::detect(&PathBuf::from("/models/xlnet-base")), None);
        assert_eq!(TokenizerFamily::detect(&PathBuf::from("")), None);
    }

    #[test]
    fn test_resolve_full_descriptor() {
        let task = TaskDescriptor::resolve("OMCS_Bert_AttRanker", &PathBuf::from("/ptm/bert-base-uncased")).unwrap();
        assert_eq!(task.tokenizer, TokenizerFamily::Bert);
        assert_eq!(task.architecture, ModelArchitecture::BertAttRanker);
        assert_eq!(task.processor, ProcessorKind::Omcs);
    }

    #[test]
    fn test_resolve_reports_failing_input() {
        let err = TaskDescriptor::resolve("NotARealTask", &PathBuf::from("/ptm/albert-base-v2")).unwrap_err();
        assert!(err.to_string().contains("NotARealTask"));

        let err = TaskDescriptor::resolve("OMCS_Albert_Baseline", &PathBuf::from("/ptm/xlnet")).unwrap_err();
        assert!(matches!(err, RunError::NoTokenizerMatched { .. }));
    }

    #[test]
    fn test_pad_tokens_differ_by_family() {
        assert_eq!(TokenizerFamily::Albert.pad_token(), "<pad>");
        assert_eq!(TokenizerFamily::Bert.pad_token(), "[PAD]");
    }
}
