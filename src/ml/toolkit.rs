// ============================================================
// Layer 5 - Burn Toolkit
// ============================================================
// The production Toolkit: HuggingFace tokenizers for text,
// McProcessor for data, MultipleChoice (Burn, wgpu) for the
// model. The orchestrator only sees the Toolkit trait.

use anyhow::Result;
use burn::prelude::Backend;
use rand::rngs::StdRng;
use std::path::Path;

use crate::data::{dataset::BatchSource, processor::McProcessor};
use crate::domain::config::{DatasetSplit, RunConfig};
use crate::domain::error::RunError;
use crate::domain::task::{ProcessorKind, TokenizerFamily};
use crate::domain::traits::Toolkit;
use crate::infra::tokenizer_store::PretrainedTokenizer;
use crate::ml::trainer::{MultipleChoice, TrainBackend};

#[derive(Debug, Default)]
pub struct BurnToolkit;

/// Reseed the backend RNG behind weight init, dropout and Tensor::random.
fn reseed_backend<B: Backend>(seed: u64) {
    B::seed(seed);
    tracing::debug!("Backend RNG seeded with {}", seed);
}

impl Toolkit for BurnToolkit {
    type Tokenizer  = PretrainedTokenizer;
    type Loader     = BatchSource;
    type Processor  = McProcessor;
    type Controller = MultipleChoice;

    fn reseed(&mut self, seed: u64) {
        reseed_backend::<TrainBackend>(seed);
    }

    fn load_tokenizer(
        &self,
        family:    TokenizerFamily,
        vocab_dir: &Path,
    ) -> Result<PretrainedTokenizer, RunError> {
        PretrainedTokenizer::from_pretrained(family, vocab_dir)
    }

    fn processor(
        &self,
        kind:   ProcessorKind,
        config: &RunConfig,
        split:  DatasetSplit,
        rng:    StdRng,
    ) -> McProcessor {
        McProcessor::new(kind, config, split, rng)
    }

    fn controller(&self, config: &RunConfig, tokenizer: &PretrainedTokenizer) -> Result<MultipleChoice> {
        MultipleChoice::new(config, tokenizer.vocab_size())
    }
}
