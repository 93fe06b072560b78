// ============================================================
// Layer 2 - Mission Orchestrator
// ============================================================
// Drives one run through its lifecycle, strictly in order:
//
//   Start
//     │  set_result (result dir, run log, manifest) + set_seed
//     ▼
//   Configured
//     │  tokenizer family + task registry lookup, load tokenizer
//     ▼
//   Resolved
//     │  one data pipeline per split the mission needs:
//     │    train → {train, dev}   eval → {dev}   predict → {test}
//     ▼
//   DataReady
//     │  build controller, init with the resolved architecture
//     ▼
//   ControllerReady → Executing → Done
//
// Any error moves the run to Failed. Nothing is retried. A
// resolution failure stops the run before any data is read.
//
// Reference: Rust Book §17 (State pattern), §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    path::PathBuf,
    time::{Duration, Instant},
};

use crate::domain::config::{DatasetSplit, MissionKind, RunConfig};
use crate::domain::task::TaskDescriptor;
use crate::domain::traits::{Controller, DataProcessor, Toolkit};
use crate::infra::run_dir::{set_result, RunSetup};
use crate::infra::seed::{set_seed, RunRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionState {
    Start,
    Configured,
    Resolved,
    DataReady,
    ControllerReady,
    Executing,
    Done,
    Failed,
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct MissionReport {
    pub mission:    MissionKind,
    pub task:       TaskDescriptor,
    pub result_dir: PathBuf,
    pub elapsed:    Duration,
}

pub struct MissionOrchestrator<K: Toolkit> {
    toolkit: K,
    history: Vec<MissionState>,
}

impl<K: Toolkit> MissionOrchestrator<K> {
    pub fn new(toolkit: K) -> Self {
        Self { toolkit, history: vec![MissionState::Start] }
    }

    pub fn state(&self) -> MissionState {
        self.history.last().copied().unwrap_or(MissionState::Start)
    }

    /// Every state the last run passed through, in order.
    pub fn history(&self) -> &[MissionState] {
        &self.history
    }

    pub fn toolkit(&self) -> &K {
        &self.toolkit
    }

    fn enter(&mut self, state: MissionState) {
        tracing::debug!("Mission state: {:?} → {:?}", self.state(), state);
        self.history.push(state);
    }

    /// Run `config` to Done, or to Failed with the error that stopped it.
    pub fn run(&mut self, config: RunConfig) -> Result<MissionReport> {
        let started = Instant::now();
        self.history = vec![MissionState::Start];

        let RunSetup { config, result_dir, log } = match set_result(config) {
            Ok(setup) => setup,
            Err(e) => {
                self.enter(MissionState::Failed);
                tracing::error!(
                    "Run setup failed after {:.1}s ({:?} error): {}",
                    started.elapsed().as_secs_f64(),
                    e.kind(),
                    e
                );
                return Err(e.into());
            }
        };

        let outcome = self.drive(&config);
        let elapsed = started.elapsed();

        let result = match outcome {
            Ok(task) => {
                self.enter(MissionState::Done);
                tracing::info!(
                    "Mission '{}' for task '{}' done in {:.1}s",
                    config.mission.as_str(),
                    config.task_name,
                    elapsed.as_secs_f64()
                );
                Ok(MissionReport { mission: config.mission, task, result_dir, elapsed })
            }
            Err(e) => {
                self.enter(MissionState::Failed);
                tracing::error!(
                    "Mission '{}' for task '{}' failed after {:.1}s: {:#}",
                    config.mission.as_str(),
                    config.task_name,
                    elapsed.as_secs_f64(),
                    e
                );
                Err(e)
            }
        };

        log.close();
        result
    }

    fn drive(&mut self, config: &RunConfig) -> Result<TaskDescriptor> {
        // ── Start → Configured ───────────────────────────────────────────────
        let mut rng = set_seed(config.seed, &mut self.toolkit);
        self.enter(MissionState::Configured);

        // ── Configured → Resolved ────────────────────────────────────────────
        let task = TaskDescriptor::resolve(&config.task_name, &config.ptm_model_vocab_dir)?;
        tracing::info!(
            "Task '{}' → tokenizer {:?}, model {:?}, processor {:?}",
            config.task_name,
            task.tokenizer,
            task.architecture,
            task.processor
        );
        let tokenizer = self
            .toolkit
            .load_tokenizer(task.tokenizer, &config.ptm_model_vocab_dir)?;
        self.enter(MissionState::Resolved);

        // ── Resolved → DataReady ─────────────────────────────────────────────
        let mut loaders = HashMap::new();
        for &split in config.mission.required_splits() {
            let loader = self.build_pipeline(&task, config, split, &tokenizer, &mut rng)?;
            loaders.insert(split, loader);
        }
        self.enter(MissionState::DataReady);

        // ── DataReady → ControllerReady ──────────────────────────────────────
        let mut controller = self.toolkit.controller(config, &tokenizer)?;
        controller.init(task.architecture)?;
        self.enter(MissionState::ControllerReady);

        // ── ControllerReady → Executing ──────────────────────────────────────
        self.enter(MissionState::Executing);
        let mut take = |split: DatasetSplit| {
            loaders
                .remove(&split)
                .with_context(|| format!("no {} loader was built", split.as_str()))
        };
        match config.mission {
            MissionKind::Train => {
                let train = take(DatasetSplit::Train)?;
                let dev   = take(DatasetSplit::Dev)?;
                controller.train(train, dev)?;
            }
            MissionKind::Evaluate => {
                controller.evaluate(take(DatasetSplit::Dev)?)?;
            }
            MissionKind::Predict => {
                tracing::warn!(
                    "Predict mission: test data and model are ready, but no inference step exists; nothing was predicted"
                );
            }
        }
        Ok(task)
    }

    /// Data pipeline for one split: new processor, load, build batches.
    fn build_pipeline(
        &self,
        task:      &TaskDescriptor,
        config:    &RunConfig,
        split:     DatasetSplit,
        tokenizer: &K::Tokenizer,
        rng:       &mut RunRng,
    ) -> Result<K::Loader> {
        let mut processor = self.toolkit.processor(task.processor, config, split, rng.fork());
        processor.load_data()?;

        let batch_size = match split {
            DatasetSplit::Train => config.train_batch_size,
            DatasetSplit::Dev | DatasetSplit::Test => config.evltest_batch_size,
        };
        let loader = processor.make_dataloader(tokenizer, batch_size, config.max_seq_len, split.shuffles())?;
        tracing::info!("{} data ready (batch_size={})", split.as_str(), batch_size);
        Ok(loader)
    }
}
