// ============================================================
// Layer 3 - Run Configuration
// ============================================================
// Every hyperparameter and path a run needs. A RunConfig is
// built once from the command line, receives its result
// directory exactly once during setup, and is read-only from
// then on. It is Serialize so it can be dumped as the run
// manifest (task_args.json).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum number of tokens per (question, choice) sequence.
pub const MAX_SEQ_LEN: usize = 128;

/// The three run lifecycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionKind {
    Train,
    #[serde(rename = "eval")]
    Evaluate,
    Predict,
}

impl MissionKind {
    /// Splits the data pipeline must prepare, in load order.
    pub fn required_splits(&self) -> &'static [DatasetSplit] {
        match self {
            MissionKind::Train    => &[DatasetSplit::Train, DatasetSplit::Dev],
            MissionKind::Evaluate => &[DatasetSplit::Dev],
            MissionKind::Predict  => &[DatasetSplit::Test],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionKind::Train    => "train",
            MissionKind::Evaluate => "eval",
            MissionKind::Predict  => "predict",
        }
    }
}

/// Which raw split a data processor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSplit {
    Train,
    Dev,
    Test,
}

impl DatasetSplit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Dev   => "dev",
            DatasetSplit::Test  => "test",
        }
    }

    /// Only the training split is shuffled; dev and test keep file order
    /// so predictions line up with the raw records.
    pub fn shuffles(&self) -> bool {
        matches!(self, DatasetSplit::Train)
    }
}

/// Checkpoint cadence handed to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    Epoch,
    Step,
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub task_name:                   String,
    pub mission:                     MissionKind,
    pub fp16:                        bool,
    /// Empty means CPU.
    pub gpu_ids:                     Vec<usize>,
    pub seed:                        u64,
    pub save_mode:                   SaveMode,
    pub print_step:                  usize,
    pub cs_num:                      usize,
    pub train_batch_size:            usize,
    pub evltest_batch_size:          usize,
    pub gradient_accumulation_steps: usize,
    pub num_train_epochs:            usize,
    pub lr:                          f64,
    pub warmup_proportion:           f64,
    pub weight_decay:                f64,
    pub max_seq_len:                 usize,
    pub dataset_dir:                 PathBuf,
    pub result_dir:                  Option<PathBuf>,
    pub saved_model_dir:             Option<PathBuf>,
    #[serde(rename = "PTM_model_vocab_dir")]
    pub ptm_model_vocab_dir:         PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            task_name:                   String::new(),
            mission:                     MissionKind::Train,
            fp16:                        false,
            gpu_ids:                     Vec::new(),
            seed:                        42,
            save_mode:                   SaveMode::End,
            print_step:                  250,
            cs_num:                      0,
            train_batch_size:            4,
            evltest_batch_size:          4,
            gradient_accumulation_steps: 1,
            num_train_epochs:            5,
            lr:                          2e-5,
            warmup_proportion:           0.1,
            weight_decay:                0.1,
            max_seq_len:                 MAX_SEQ_LEN,
            dataset_dir:                 PathBuf::from("../DATA"),
            result_dir:                  None,
            saved_model_dir:             None,
            ptm_model_vocab_dir:         PathBuf::new(),
        }
    }
}

impl RunConfig {
    /// Tasks reading the OMCS source carry supporting sentences per choice.
    pub fn is_knowledge_augmented(&self) -> bool {
        self.task_name.contains("OMCS")
    }

    /// Inject the resolved result directory. Consumes self so the
    /// single mutation happens before anyone else can hold a borrow.
    pub fn with_result_dir(mut self, dir: PathBuf) -> Self {
        self.result_dir = Some(dir);
        self
    }

    pub fn result_dir(&self) -> Option<&Path> {
        self.result_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_splits_per_mission() {
        assert_eq!(
            MissionKind::Train.required_splits(),
            &[DatasetSplit::Train, DatasetSplit::Dev]
        );
        assert_eq!(MissionKind::Evaluate.required_splits(), &[DatasetSplit::Dev]);
        assert_eq!(MissionKind::Predict.required_splits(), &[DatasetSplit::Test]);
    }

    #[test]
    fn test_only_train_split_shuffles() {
        assert!(DatasetSplit::Train.shuffles());
        assert!(!DatasetSplit::Dev.shuffles());
        assert!(!DatasetSplit::Test.shuffles());
    }

    #[test]
    fn test_knowledge_augmented_detection() {
        let mut cfg = RunConfig::default();
        cfg.task_name = "OMCS_Albert_Baseline".into();
        assert!(cfg.is_knowledge_augmented());
        cfg.task_name = "Origin_Albert_Baseline".into();
        assert!(!cfg.is_knowledge_augmented());
    }

    #[test]
    fn test_manifest_field_names() {
        let cfg = RunConfig {
            mission: MissionKind::Evaluate,
            ..RunConfig::default()
        };
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["mission"], "eval");
        assert_eq!(json["save_mode"], "end");
        assert!(json.get("PTM_model_vocab_dir").is_some());
    }
}
