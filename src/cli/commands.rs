// ============================================================
// Layer 1 - CLI Flags
// ============================================================
// One flat set of flags; --mission picks the lifecycle. Flag
// spellings keep their underscores (--task_name,
// --PTM_model_vocab_dir, ...) so existing run scripts work.
//
// clap's derive macros generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Range and cross-flag checks happen once, in
// TryFrom<RunArgs> for RunConfig, before anything touches disk.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, ValueEnum};
use std::path::PathBuf;

use crate::domain::config::{MissionKind, RunConfig, SaveMode, MAX_SEQ_LEN};
use crate::domain::error::RunError;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionArg {
    Train,
    Eval,
    Predict,
}

impl From<MissionArg> for MissionKind {
    fn from(m: MissionArg) -> Self {
        match m {
            MissionArg::Train   => MissionKind::Train,
            MissionArg::Eval    => MissionKind::Evaluate,
            MissionArg::Predict => MissionKind::Predict,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveModeArg {
    Epoch,
    Step,
    End,
}

impl From<SaveModeArg> for SaveMode {
    fn from(s: SaveModeArg) -> Self {
        match s {
            SaveModeArg::Epoch => SaveMode::Epoch,
            SaveModeArg::Step  => SaveMode::Step,
            SaveModeArg::End   => SaveMode::End,
        }
    }
}

/// Every flag of a run. Each field becomes a --flag on the command line.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Task identifier, <DataSource>_<PTM>_<ModelVariant> (e.g. OMCS_Albert_Baseline)
    #[arg(long = "task_name")]
    pub task_name: Option<String>,

    /// Lifecycle to run
    #[arg(long = "mission", value_enum)]
    pub mission: MissionArg,

    /// 1 = request half precision (recorded; the backend trains in f32)
    #[arg(long = "fp16", default_value_t = 0)]
    pub fp16: i64,

    /// "-1" for CPU, otherwise comma-separated device indices
    #[arg(long = "gpu_ids", default_value = "-1", allow_hyphen_values = true)]
    pub gpu_ids: String,

    #[arg(long = "seed", default_value_t = 42)]
    pub seed: u64,

    /// Checkpoint cadence
    #[arg(long = "save_mode", value_enum, default_value = "end")]
    pub save_mode: SaveModeArg,

    /// Log (and, with save_mode=step, checkpoint) every N optimizer steps
    #[arg(long = "print_step", default_value_t = 250)]
    pub print_step: usize,

    /// Supporting sentences kept per choice for OMCS tasks
    #[arg(long = "cs_num", default_value_t = 0)]
    pub cs_num: usize,

    #[arg(long = "train_batch_size", default_value_t = 4)]
    pub train_batch_size: usize,

    /// Batch size for the dev and test splits
    #[arg(long = "evltest_batch_size", default_value_t = 4)]
    pub evltest_batch_size: usize,

    #[arg(long = "gradient_accumulation_steps", default_value_t = 1)]
    pub gradient_accumulation_steps: usize,

    #[arg(long = "num_train_epochs", default_value_t = 5)]
    pub num_train_epochs: usize,

    /// Peak learning rate
    #[arg(long = "lr", default_value_t = 2e-5)]
    pub lr: f64,

    /// Fraction of optimizer steps spent warming up
    #[arg(long = "warmup_proportion", default_value_t = 0.1)]
    pub warmup_proportion: f64,

    #[arg(long = "weight_decay", default_value_t = 0.1)]
    pub weight_decay: f64,

    /// Root of the raw data (csqa/ and omcs/ live below it)
    #[arg(long = "dataset_dir", default_value = "../DATA")]
    pub dataset_dir: PathBuf,

    /// Output root for train runs
    #[arg(long = "result_dir")]
    pub result_dir: Option<PathBuf>,

    /// Trained run directory reused by eval and predict
    #[arg(long = "saved_model_dir")]
    pub saved_model_dir: Option<PathBuf>,

    /// Pretrained model vocabulary directory (holds tokenizer.json)
    #[arg(long = "PTM_model_vocab_dir")]
    pub ptm_model_vocab_dir: Option<PathBuf>,
}

/// Parse "-1" (CPU) or "0,1,..." into device indices.
fn parse_gpu_ids(raw: &str) -> Result<Vec<usize>, RunError> {
    let raw = raw.trim();
    if raw == "-1" {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|id| {
            id.trim().parse::<usize>().map_err(|_| {
                RunError::configuration(format!(
                    "--gpu_ids must be -1 or a comma list of device indices, got '{raw}'"
                ))
            })
        })
        .collect()
}

fn require_positive(name: &str, value: usize) -> Result<usize, RunError> {
    if value == 0 {
        return Err(RunError::configuration(format!("--{name} must be greater than 0")));
    }
    Ok(value)
}

/// Boundary between Layer 1 and the rest: the domain never sees clap types.
impl TryFrom<RunArgs> for RunConfig {
    type Error = RunError;

    fn try_from(a: RunArgs) -> Result<Self, RunError> {
        let task_name = a
            .task_name
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RunError::configuration("--task_name is required"))?;

        let ptm_model_vocab_dir = a
            .ptm_model_vocab_dir
            .ok_or_else(|| RunError::configuration("--PTM_model_vocab_dir is required"))?;

        let fp16 = match a.fp16 {
            0 => false,
            1 => true,
            other => {
                return Err(RunError::configuration(format!("--fp16 must be 0 or 1, got {other}")))
            }
        };

        if !a.lr.is_finite() || a.lr <= 0.0 {
            return Err(RunError::configuration(format!("--lr must be a positive number, got {}", a.lr)));
        }
        if !(0.0..=1.0).contains(&a.warmup_proportion) {
            return Err(RunError::configuration(format!(
                "--warmup_proportion must be within [0, 1], got {}",
                a.warmup_proportion
            )));
        }
        if !a.weight_decay.is_finite() || a.weight_decay < 0.0 {
            return Err(RunError::configuration(format!(
                "--weight_decay must be >= 0, got {}",
                a.weight_decay
            )));
        }

        let mission = MissionKind::from(a.mission);
        match mission {
            MissionKind::Train if a.result_dir.is_none() => {
                return Err(RunError::configuration("--result_dir is required for the train mission"));
            }
            MissionKind::Evaluate | MissionKind::Predict if a.saved_model_dir.is_none() => {
                return Err(RunError::configuration(format!(
                    "--saved_model_dir is required for the {} mission",
                    mission.as_str()
                )));
            }
            _ => {}
        }

        Ok(RunConfig {
            task_name,
            mission,
            fp16,
            gpu_ids: parse_gpu_ids(&a.gpu_ids)?,
            seed: a.seed,
            save_mode: a.save_mode.into(),
            print_step: require_positive("print_step", a.print_step)?,
            cs_num: a.cs_num,
            train_batch_size: require_positive("train_batch_size", a.train_batch_size)?,
            evltest_batch_size: require_positive("evltest_batch_size", a.evltest_batch_size)?,
            gradient_accumulation_steps: require_positive(
                "gradient_accumulation_steps",
                a.gradient_accumulation_steps,
            )?,
            num_train_epochs: require_positive("num_train_epochs", a.num_train_epochs)?,
            lr: a.lr,
            warmup_proportion: a.warmup_proportion,
            weight_decay: a.weight_decay,
            max_seq_len: MAX_SEQ_LEN,
            dataset_dir: a.dataset_dir,
            result_dir: a.result_dir,
            saved_model_dir: a.saved_model_dir,
            ptm_model_vocab_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(flags: &[&str]) -> Result<RunConfig, RunError> {
        let argv = std::iter::once("csqa-runner").chain(flags.iter().copied());
        RunConfig::try_from(TestCli::parse_from(argv).args)
    }

    const TRAIN: &[&str] = &[
        "--task_name", "OMCS_Albert_Baseline",
        "--mission", "train",
        "--PTM_model_vocab_dir", "/ptm/albert-base-v2",
        "--result_dir", "/tmp/results",
    ];

    #[test]
    fn test_defaults() {
        let cfg = parse(TRAIN).unwrap();
        assert_eq!(cfg.mission, MissionKind::Train);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.save_mode, SaveMode::End);
        assert_eq!(cfg.print_step, 250);
        assert_eq!(cfg.train_batch_size, 4);
        assert_eq!(cfg.evltest_batch_size, 4);
        assert_eq!(cfg.num_train_epochs, 5);
        assert_eq!(cfg.lr, 2e-5);
        assert!(cfg.gpu_ids.is_empty());
        assert!(!cfg.fp16);
        assert_eq!(cfg.dataset_dir, PathBuf::from("../DATA"));
        assert_eq!(cfg.max_seq_len, MAX_SEQ_LEN);
    }

    #[test]
    fn test_eval_mission_and_gpu_list() {
        let cfg = parse(&[
            "--task_name", "Origin_Albert_Baseline",
            "--mission", "eval",
            "--PTM_model_vocab_dir", "/ptm/albert-base-v2",
            "--saved_model_dir", "/runs/a",
            "--gpu_ids", "0,2",
            "--fp16", "1",
            "--save_mode", "epoch",
        ])
        .unwrap();
        assert_eq!(cfg.mission, MissionKind::Evaluate);
        assert_eq!(cfg.gpu_ids, vec![0, 2]);
        assert!(cfg.fp16);
        assert_eq!(cfg.save_mode, SaveMode::Epoch);
    }

    #[test]
    fn test_missing_task_name() {
        let err = parse(&["--mission", "train", "--PTM_model_vocab_dir", "/ptm/bert", "--result_dir", "/r"])
            .unwrap_err();
        assert!(matches!(err, RunError::Configuration(_)));
    }

    #[test]
    fn test_eval_requires_saved_model_dir() {
        let err = parse(&[
            "--task_name", "Origin_Albert_Baseline",
            "--mission", "predict",
            "--PTM_model_vocab_dir", "/ptm/albert-base-v2",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("--saved_model_dir"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for flag in [
            "--fp16=2",
            "--warmup_proportion=1.5",
            "--weight_decay=-0.1",
            "--lr=0",
            "--train_batch_size=0",
            "--gpu_ids=0,x",
        ] {
            let mut flags = TRAIN.to_vec();
            flags.push(flag);
            let err = parse(&flags).unwrap_err();
            assert!(matches!(err, RunError::Configuration(_)), "{flag}");
        }
    }
}
