// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums, and traits that name the concepts
// of the system: the question/context a user submits, what
// the two pipelines return, and the handles that say whether
// a pipeline was loaded at all.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// Request-scoped value records
pub mod query;

// Present/Absent handles for the two pretrained pipelines
pub mod pipeline;

// The four example rows shown under the form
pub mod examples;

// Core abstractions (traits) that the ML layer implements
pub mod traits;

// Mock pipelines shared by the unit tests of the upper layers
#[cfg(test)]
pub mod testing;
