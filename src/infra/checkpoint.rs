// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores multiple-choice model weights inside the
// run's result directory with Burn's CompactRecorder.
//
// Layout:
//   <result_dir>/
//     model_epoch_1.mpk.gz     ← save_mode = epoch
//     model_step_500.mpk.gz    ← save_mode = step
//     model_end.mpk.gz         ← save_mode = end
//     latest_checkpoint.json   ← name of the newest weights file
//     model_config.json        ← architecture + sizes to rebuild
//
// Evaluate and predict missions point at a trained run's
// directory and restore from latest_checkpoint.json.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::domain::task::ModelArchitecture;
use crate::ml::model::{MultipleChoiceConfig, MultipleChoiceModel};

const LATEST_FILE: &str = "latest_checkpoint.json";
const CONFIG_FILE: &str = "model_config.json";

/// Everything needed to rebuild the model before loading weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModelConfig {
    pub architecture: ModelArchitecture,
    pub model:        MultipleChoiceConfig,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// The directory must already exist; the run configuration manager creates it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save weights under `model_<tag>` and point latest_checkpoint.json at it.
    pub fn save_model<B: Backend>(&self, model: &MultipleChoiceModel<B>, tag: &str) -> Result<()> {
        let name = format!("model_{tag}");
        let path = self.dir.join(&name);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        fs::write(self.dir.join(LATEST_FILE), serde_json::to_string(&name)?)
            .with_context(|| format!("Failed to write {LATEST_FILE}"))?;

        tracing::info!("Saved checkpoint '{}'", name);
        Ok(())
    }

    /// Restore the newest weights into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  MultipleChoiceModel<B>,
        device: &B::Device,
    ) -> Result<MultipleChoiceModel<B>> {
        let name = self.latest()?;
        let path = self.dir.join(&name);

        tracing::info!("Loading checkpoint '{}'", path.display());
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &SavedModelConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<SavedModelConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read model config from '{}'. Is --saved_model_dir a trained run?",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn latest(&self) -> Result<String> {
        let path = self.dir.join(LATEST_FILE);
        let s = fs::read_to_string(&path).with_context(|| {
            format!("Cannot find '{}'. Has this run saved a model?", path.display())
        })?;
        Ok(serde_json::from_str::<String>(&s)?)
    }
}
