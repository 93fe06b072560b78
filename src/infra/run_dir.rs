// ============================================================
// Layer 6 - Run Configuration Manager
// ============================================================
// Decides where a run writes its artifacts and prepares that
// directory:
//
//   train       → <result_dir>/<task_name>/<vocab basename>/<run tag>/
//   eval/predict → <saved_model_dir>, reused verbatim
//
// The run tag is a timestamp plus a fixed-order encoding of the
// hyperparameters that distinguish runs, e.g.
//
//   Oct16-1405_lr2e-05_warm0.1_decay0.1_seed42_cs2
//
// Two runs with identical hyperparameters started in the same
// minute get the same tag and share a directory.
//
// After the directory exists:
//   1. the run log sink is attached (task_log.txt)
//   2. the full configuration is dumped as task_args.json
//      (task_args_eval.json / task_args_predict.json when
//      reusing a trained run, so its training record stays)
//
// Failing to create the directory (or, for eval/predict, to
// find it) or to open the log is fatal.
// The manifest is best-effort.

use chrono::{DateTime, Local};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::domain::config::{MissionKind, RunConfig};
use crate::domain::error::RunError;
use crate::infra::logging::RunLog;

pub const MANIFEST_FILE: &str = "task_args.json";

/// Manifest name for a mission. Only train owns `task_args.json`.
pub fn manifest_file(mission: MissionKind) -> String {
    match mission {
        MissionKind::Train => MANIFEST_FILE.to_string(),
        MissionKind::Evaluate | MissionKind::Predict => {
            format!("task_args_{}.json", mission.as_str())
        }
    }
}

const TIMESTAMP_FORMAT: &str = "%b%d-%H%M";

/// A configured run: the frozen config, where it writes, and its log sink.
#[derive(Debug)]
pub struct RunSetup {
    pub config:     RunConfig,
    pub result_dir: PathBuf,
    pub log:        RunLog,
}

/// Prepare the result directory for `config` using the current local time.
pub fn set_result(config: RunConfig) -> Result<RunSetup, RunError> {
    set_result_at(config, Local::now())
}

pub fn set_result_at(config: RunConfig, now: DateTime<Local>) -> Result<RunSetup, RunError> {
    let result_dir = resolve_result_dir(&config, &now)?;

    // eval/predict point at an existing run and never create it
    let prepared = match config.mission {
        MissionKind::Train => fs::create_dir_all(&result_dir),
        MissionKind::Evaluate | MissionKind::Predict if result_dir.is_dir() => Ok(()),
        MissionKind::Evaluate | MissionKind::Predict => Err(io::Error::new(
            io::ErrorKind::NotFound,
            "saved model directory does not exist",
        )),
    };
    prepared.map_err(|source| RunError::Directory {
        path: result_dir.clone(),
        source,
    })?;

    let log = RunLog::attach(&result_dir).map_err(|source| RunError::Directory {
        path: result_dir.clone(),
        source,
    })?;
    tracing::info!("Result directory: '{}'", result_dir.display());
    tracing::debug!("Run log attached at '{}'", log.path().display());

    let config = config.with_result_dir(result_dir.clone());
    match write_manifest(&config, &result_dir) {
        Ok(path) => tracing::debug!("Run manifest written to '{}'", path.display()),
        Err(e)   => tracing::warn!("{}", e),
    }

    Ok(RunSetup { config, result_dir, log })
}

/// Compute the result directory without touching the filesystem.
pub fn resolve_result_dir(config: &RunConfig, now: &DateTime<Local>) -> Result<PathBuf, RunError> {
    match config.mission {
        MissionKind::Train => {
            let root = config.result_dir.as_ref().ok_or_else(|| {
                RunError::configuration("--result_dir is required for the train mission")
            })?;
            Ok(root
                .join(&config.task_name)
                .join(vocab_basename(&config.ptm_model_vocab_dir))
                .join(run_tag(config, now)))
        }
        MissionKind::Evaluate | MissionKind::Predict => config
            .saved_model_dir
            .clone()
            .ok_or_else(|| {
                RunError::configuration(format!(
                    "--saved_model_dir is required for the {} mission",
                    config.mission.as_str()
                ))
            }),
    }
}

/// Timestamp + hyperparameter encoding naming one training run.
pub fn run_tag(config: &RunConfig, now: &DateTime<Local>) -> String {
    let mut tag = format!(
        "{}_lr{}_warm{}_decay{}_seed{}",
        now.format(TIMESTAMP_FORMAT),
        python_sci(config.lr, 0),
        python_general(config.warmup_proportion, 2),
        python_general(config.weight_decay, 2),
        config.seed,
    );
    if config.is_knowledge_augmented() {
        tag.push_str(&format!("_cs{}", config.cs_num));
    }
    tag
}

/// Write the configuration as pretty JSON into the result directory.
pub fn write_manifest(config: &RunConfig, result_dir: &Path) -> Result<PathBuf, RunError> {
    let path = result_dir.join(manifest_file(config.mission));
    let json = serde_json::to_string_pretty(config).map_err(|e| RunError::Manifest {
        path:   path.clone(),
        reason: e.to_string(),
    })?;
    fs::write(&path, &json).map_err(|e| RunError::Manifest {
        path:   path.clone(),
        reason: e.to_string(),
    })?;
    println!("{json}");
    Ok(path)
}

/// Last component of the vocabulary path, safe to use as a directory name.
/// Both separators are honoured so Windows-style paths work everywhere.
fn vocab_basename(vocab_dir: &Path) -> String {
    let raw  = vocab_dir.to_string_lossy();
    let last = raw
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("");

    let cleaned: String = last
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "vocab".to_string(),
        _ => cleaned,
    }
}

// ─── Float rendering ──────────────────────────────────────────────────────────
// Run tags written by earlier tooling use printf-style exponents with a
// signed two-digit exponent ("2e-05") and shortest general notation
// ("0.1", "1e-05"). Keep producing the same names.

fn python_sci(x: f64, precision: usize) -> String {
    let s = format!("{:.*e}", precision, x);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None    => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

fn python_general(x: f64, precision: usize) -> String {
    if x == 0.0 {
        return "0.0".to_string();
    }
    if !x.is_finite() {
        return x.to_string();
    }
    let precision = precision.max(1);

    let sci = format!("{:.*e}", precision - 1, x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None         => return sci,
    };

    if exp < -4 || exp >= precision as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(&mantissa), sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        let fixed    = trim_fraction(&format!("{:.*}", decimals, x));
        if fixed.contains('.') { fixed } else { format!("{fixed}.0") }
    }
}

fn trim_fraction(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
