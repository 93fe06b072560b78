// ============================================================
// Layer 2 - Application / Mission Orchestration
// ============================================================
// This layer sequences all the other layers to carry out one
// mission (train, evaluate or predict).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No flag parsing here (that's Layer 1)
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination through the Toolkit traits
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The mission state machine
pub mod mission;
