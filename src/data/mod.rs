// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// From raw JSON-lines splits to tensor batches:
//
//   <dataset_dir>/csqa/*.jsonl or <dataset_dir>/omcs/*.jsonl
//       │
//       ▼
//   JsonlLoader   → parses records into McQuestions
//       │
//       ▼
//   Preprocessor  → normalises every text field
//       │
//       ▼
//   McProcessor   → samples OMCS evidence, encodes each
//       │           (stem, choice) pair with the tokenizer
//       ▼
//   BatchSource   → dataset + batch size + shuffle seed
//       │
//       ▼
//   ChoiceBatcher → [batch, choices, seq_len] tensors for the
//                   controller's burn DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads a split's JSON-lines file
pub mod loader;

/// Cleans and normalises text fields
pub mod preprocessor;

/// Per-split data processor (load + encode)
pub mod processor;

/// Encoded samples, Burn Dataset impl and the batch source
pub mod dataset;

/// Implements Burn's Batcher trait for multiple-choice batches
pub mod batcher;
