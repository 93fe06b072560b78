// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns that touch the filesystem or process
// state:
//
//   run_dir.rs         - result directory naming and creation,
//                        run manifest (task_args.json)
//   logging.rs         - console output and the per-run
//                        task_log.txt sink
//   seed.rs            - seeding every random source of a run
//   tokenizer_store.rs - pretrained tokenizer loading and pair
//                        encoding
//   checkpoint.rs      - model weights + model config on disk
//   metrics.rs         - per-epoch CSV and evaluation summaries
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Result directory, log sink and manifest for one run
pub mod run_dir;

/// Console and per-run file logging
pub mod logging;

/// Deterministic seeding
pub mod seed;

/// Pretrained tokenizer loading
pub mod tokenizer_store;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
