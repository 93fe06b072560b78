// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model and training code.
// Data types shared with Layer 4 (batches, datasets) are the
// only other place burn appears.
//
// What's in this layer:
//
//   model.rs    - Transformer encoder scoring (question, choice)
//                 pairs, with one pooling head per architecture:
//                 • Token, position and segment embeddings
//                 • Multi-head self-attention (padding masked)
//                 • Feed-forward networks (GELU activation)
//                 • [CLS], attention-merge or ranker pooling
//
//   schedule.rs - Linear warmup / linear decay learning rate
//
//   trainer.rs  - The MultipleChoice controller: init, train
//                 loop (AdamW, gradient accumulation,
//                 checkpoints) and evaluation
//
//   toolkit.rs  - BurnToolkit, the Toolkit the CLI hands to
//                 the mission orchestrator
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Multiple-choice transformer and its pooling heads
pub mod model;

/// Learning-rate schedule
pub mod schedule;

/// Train / evaluate controller with checkpointing
pub mod trainer;

/// Production Toolkit wiring tokenizer, processors and controller
pub mod toolkit;
