// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing a run:
// what was asked for (RunConfig), which task it resolves to
// (TaskDescriptor), what a question looks like (McQuestion)
// and what the external modeling toolkit must provide.
//
// Rules for this layer:
//   - NO burn or tokenizers types
//   - NO file I/O
//   - Only plain data and the traits other layers implement
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// Run configuration, missions, splits and save cadence
pub mod config;

// Task registry and tokenizer-family detection
pub mod task;

// Multiple-choice question with its answer choices
pub mod question;

// Error taxonomy shared by every layer
pub mod error;

// Contracts for the tokenizer, data processor and controller
pub mod traits;
