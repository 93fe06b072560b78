// ============================================================
// Layer 3 - Collaborator Traits
// ============================================================
// The orchestrator never touches tokenizers, tensors or models
// directly. It talks to three collaborators through these
// traits:
//
//   DataProcessor - loads one raw split and builds its batches
//   Controller    - owns the model and the train / eval loops
//   Toolkit       - factory tying a tokenizer, processors and a
//                   controller together for one backend
//
// The burn-backed implementation lives in Layer 5 (ml::toolkit);
// tests swap in a recording mock.
//
// Reference: Rust Book §10 (Traits), §19 (Associated Types)

use anyhow::Result;
use rand::rngs::StdRng;
use std::path::Path;

use crate::domain::config::{DatasetSplit, RunConfig};
use crate::domain::error::RunError;
use crate::domain::task::{ModelArchitecture, ProcessorKind, TokenizerFamily};

// ─── DataProcessor ────────────────────────────────────────────────────────────
/// Reads one split of a dataset and turns it into a batch source.
pub trait DataProcessor {
    type Tokenizer;
    type Loader;

    /// Read the raw split from disk. Missing or malformed files are fatal.
    fn load_data(&mut self) -> Result<(), RunError>;

    /// Encode the loaded records and wrap them in a batch source.
    fn make_dataloader(
        &self,
        tokenizer:   &Self::Tokenizer,
        batch_size:  usize,
        max_seq_len: usize,
        shuffle:     bool,
    ) -> Result<Self::Loader, RunError>;
}

// ─── Controller ───────────────────────────────────────────────────────────────
/// Owns the model and runs the step loops.
pub trait Controller {
    type Loader;

    /// Build the model for `architecture` (and restore weights when the
    /// mission reuses a saved model).
    fn init(&mut self, architecture: ModelArchitecture) -> Result<()>;

    fn train(&mut self, train: Self::Loader, dev: Self::Loader) -> Result<()>;

    fn evaluate(&mut self, dev: Self::Loader) -> Result<()>;
}

// ─── Toolkit ──────────────────────────────────────────────────────────────────
/// Everything backend-specific the orchestrator needs, behind one factory.
pub trait Toolkit {
    type Tokenizer;
    type Loader;
    type Processor: DataProcessor<Tokenizer = Self::Tokenizer, Loader = Self::Loader>;
    type Controller: Controller<Loader = Self::Loader>;

    /// Seed the toolkit's own random sources (device RNG, weight init).
    fn reseed(&mut self, seed: u64);

    fn load_tokenizer(
        &self,
        family:    TokenizerFamily,
        vocab_dir: &Path,
    ) -> Result<Self::Tokenizer, RunError>;

    fn processor(
        &self,
        kind:   ProcessorKind,
        config: &RunConfig,
        split:  DatasetSplit,
        rng:    StdRng,
    ) -> Self::Processor;

    fn controller(&self, config: &RunConfig, tokenizer: &Self::Tokenizer) -> Result<Self::Controller>;
}
