// ============================================================
// Layer 5 - Multiple-Choice Controller
// ============================================================
// The Controller collaborator: owns the model and runs the
// train and evaluate loops with Burn.
//
//   init(arch)      → train: fresh model, model_config.json
//                     eval/predict: rebuild from the saved run
//   train(tr, dev)  → AdamW + warmup/decay, gradient accumulation,
//                     dev pass per epoch, metrics.csv, checkpoints
//   evaluate(dev)   → loss + accuracy → eval_result.json
//
// Burn notes:
//   - Training uses TrainBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on EvalBackend (Wgpu)
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::{Context, Result};
use burn::{
    backend::wgpu::WgpuDevice,
    data::dataloader::DataLoader,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsAccumulator, GradientsParams, Optimizer},
    prelude::*,
};
use std::{path::PathBuf, sync::Arc, time::Instant};

use crate::data::{batcher::ChoiceBatch, dataset::BatchSource};
use crate::domain::config::{MissionKind, RunConfig, SaveMode};
use crate::domain::task::ModelArchitecture;
use crate::domain::traits::Controller;
use crate::infra::checkpoint::{CheckpointManager, SavedModelConfig};
use crate::infra::metrics::{dump_eval_result, EpochMetrics, EvalSummary, MetricsLogger};
use crate::ml::model::{MultipleChoiceConfig, MultipleChoiceModel};
use crate::ml::schedule::LinearWarmup;

pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
pub type EvalBackend  = burn::backend::Wgpu;

/// `gpu_ids` empty → CPU, otherwise the first listed discrete GPU.
pub fn select_device(gpu_ids: &[usize]) -> WgpuDevice {
    match gpu_ids {
        []         => WgpuDevice::Cpu,
        [id]       => WgpuDevice::DiscreteGpu(*id),
        [id, rest @ ..] => {
            tracing::warn!("Multiple gpu_ids given; training on GPU {} only (ignoring {:?})", id, rest);
            WgpuDevice::DiscreteGpu(*id)
        }
    }
}

pub struct MultipleChoice {
    config:     RunConfig,
    result_dir: PathBuf,
    vocab_size: usize,
    device:     WgpuDevice,
    ckpt:       CheckpointManager,
    model:      Option<MultipleChoiceModel<TrainBackend>>,
}

impl MultipleChoice {
    pub fn new(config: &RunConfig, vocab_size: usize) -> Result<Self> {
        let result_dir = config
            .result_dir()
            .context("Controller needs a result directory; run setup must come first")?
            .to_path_buf();

        let device = select_device(&config.gpu_ids);
        tracing::info!("Using WGPU device: {:?}", device);
        if config.fp16 {
            tracing::warn!("fp16 requested; Burn's wgpu backend trains in f32, flag recorded only");
        }

        Ok(Self {
            config: config.clone(),
            ckpt: CheckpointManager::new(&result_dir),
            result_dir,
            vocab_size,
            device,
            model: None,
        })
    }

    fn model(&self) -> Result<&MultipleChoiceModel<TrainBackend>> {
        self.model.as_ref().context("Controller used before init()")
    }

    fn save(&self, model: &MultipleChoiceModel<TrainBackend>, tag: &str) -> Result<()> {
        self.ckpt.save_model(model, tag)
    }
}

/// One pass over `loader` without gradients.
fn run_eval(
    model:  &MultipleChoiceModel<EvalBackend>,
    loader: &Arc<dyn DataLoader<ChoiceBatch<EvalBackend>>>,
) -> EvalSummary {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut examples = 0usize;

    for batch in loader.iter() {
        let n = batch.labels.dims()[0];
        let (loss, logits) = model.forward_loss(
            batch.input_ids,
            batch.token_type_ids,
            batch.attention_mask,
            batch.labels.clone(),
        );
        loss_sum += loss.into_scalar().elem::<f64>() * n as f64;

        let preds = logits.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = preds.equal(batch.labels).int().sum().into_scalar().elem::<i64>();
        correct  += hits as usize;
        examples += n;
    }

    if examples == 0 {
        return EvalSummary { loss: f64::NAN, accuracy: 0.0, examples };
    }
    EvalSummary {
        loss:     loss_sum / examples as f64,
        accuracy: correct as f64 / examples as f64,
        examples,
    }
}

impl Controller for MultipleChoice {
    type Loader = BatchSource;

    fn init(&mut self, architecture: ModelArchitecture) -> Result<()> {
        let model = match self.config.mission {
            MissionKind::Train => {
                let model_cfg = MultipleChoiceConfig::new(self.vocab_size, self.config.max_seq_len);
                self.ckpt.save_config(&SavedModelConfig {
                    architecture,
                    model: model_cfg.clone(),
                })?;
                model_cfg.init::<TrainBackend>(architecture, &self.device)
            }
            MissionKind::Evaluate | MissionKind::Predict => {
                let saved = self.ckpt.load_config()?;
                if saved.architecture != architecture {
                    anyhow::bail!(
                        "Saved model in '{}' is {:?}, but the task resolves to {:?}",
                        self.result_dir.display(),
                        saved.architecture,
                        architecture
                    );
                }
                let model = saved.model.init::<TrainBackend>(architecture, &self.device);
                self.ckpt.load_model(model, &self.device)?
            }
        };

        tracing::info!(
            "Model ready: {:?}, {} parameters",
            architecture,
            model.num_params()
        );
        self.model = Some(model);
        Ok(())
    }

    fn train(&mut self, train: BatchSource, dev: BatchSource) -> Result<()> {
        let mut model = self.model.take().context("Controller used before init()")?;
        let cfg = &self.config;

        let train_loader = train.build::<TrainBackend>(&self.device);
        let dev_loader   = dev.build::<EvalBackend>(&self.device);

        let accum           = cfg.gradient_accumulation_steps.max(1);
        let batches         = train.num_batches();
        let steps_per_epoch = batches.div_ceil(accum);
        let schedule        = LinearWarmup::new(
            cfg.lr,
            steps_per_epoch * cfg.num_train_epochs,
            cfg.warmup_proportion,
        );

        // ── AdamW optimiser ───────────────────────────────────────────────────
        let mut optim = AdamWConfig::new()
            .with_weight_decay(cfg.weight_decay as f32)
            .init::<TrainBackend, MultipleChoiceModel<TrainBackend>>();
        let metrics = MetricsLogger::new(&self.result_dir)?;

        tracing::info!(
            "Training: {} examples (shuffled: {}), {} epochs, {} optimizer steps/epoch, {} warmup steps",
            train.num_examples(),
            train.is_shuffled(),
            cfg.num_train_epochs,
            steps_per_epoch,
            schedule.warmup_steps()
        );

        let mut step     = 0usize;
        let mut best_acc = f64::MIN;

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=cfg.num_train_epochs {
            let started = Instant::now();
            let mut accumulator = GradientsAccumulator::new();
            let mut pending     = 0usize;
            let mut loss_sum    = 0.0f64;
            let mut seen        = 0usize;

            for (i, batch) in train_loader.iter().enumerate() {
                let (loss, _) = model.forward_loss(
                    batch.input_ids,
                    batch.token_type_ids,
                    batch.attention_mask,
                    batch.labels,
                );
                loss_sum += loss.clone().into_scalar().elem::<f64>();
                seen     += 1;

                let grads = (loss / accum as f64).backward();
                accumulator.accumulate(&model, GradientsParams::from_grads(grads, &model));
                pending += 1;

                if pending < accum && i + 1 < batches {
                    continue;
                }

                model   = optim.step(schedule.lr_at(step), model, accumulator.grads());
                pending = 0;
                step   += 1;

                if step % cfg.print_step.max(1) == 0 {
                    tracing::info!(
                        "epoch {} step {} | loss={:.4} | lr={:.3e}",
                        epoch,
                        step,
                        loss_sum / seen as f64,
                        schedule.lr_at(step)
                    );
                    if cfg.save_mode == SaveMode::Step {
                        self.save(&model, &format!("step_{step}"))?;
                    }
                }
            }

            let train_loss = if seen > 0 { loss_sum / seen as f64 } else { f64::NAN };
            let dev_summary = run_eval(&model.valid(), &dev_loader);
            let row = EpochMetrics::new(epoch, train_loss, dev_summary);
            metrics.log(&row)?;

            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} | dev_loss={:.4} | dev_acc={:.2}% | {:.1}s",
                epoch,
                cfg.num_train_epochs,
                train_loss,
                dev_summary.loss,
                dev_summary.accuracy * 100.0,
                started.elapsed().as_secs_f64()
            );
            if row.is_improvement(best_acc) {
                best_acc = dev_summary.accuracy;
            }

            if cfg.save_mode == SaveMode::Epoch {
                self.save(&model, &format!("epoch_{epoch}"))?;
            }
        }

        if cfg.save_mode == SaveMode::End {
            self.save(&model, "end")?;
        }

        tracing::info!("Training complete, best dev_acc={:.2}%", best_acc.max(0.0) * 100.0);
        self.model = Some(model);
        Ok(())
    }

    fn evaluate(&mut self, dev: BatchSource) -> Result<()> {
        let model  = self.model()?.valid();
        let loader = dev.build::<EvalBackend>(&self.device);

        let summary = run_eval(&model, &loader);
        let path    = dump_eval_result(&self.result_dir, &summary)?;

        tracing::info!(
            "Evaluation: {} examples | loss={:.4} | acc={:.2}% → '{}'",
            summary.examples,
            summary.loss,
            summary.accuracy * 100.0,
            path.display()
        );
        Ok(())
    }
}
