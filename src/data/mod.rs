// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Turns user text into model-sized pieces before inference.
//
//   context tokens
//       │
//       ▼
//   Chunker   → overlapping windows that fit the QA model
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Splits long token sequences into overlapping windows
pub mod chunker;
