// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the pipelines to answer one form
// submission. It holds no model code and renders no HTML.
//
// Rules for this layer:
//   - No ML math or tensor code here (that's Layer 5)
//   - No HTTP or printing here (that's Layer 1)
//   - Only workflow coordination and display-string formatting
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Prompt building and post-processing around the text generator
pub mod explainer;

// The validate → extract → explain → format entry point
pub mod qa_system;
