// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the outside world before the first
// request is served:
//
//   hub.rs     — Downloading and caching pretrained model
//                files from the HuggingFace hub.
//
//   device.rs  — Choosing the compute device (GPU if one
//                answers, otherwise CPU).
//
//   loader.rs  — Building both pipelines from the cached
//                files and turning load failures into
//                Absent handles instead of process errors.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// HuggingFace hub download cache
pub mod hub;

/// Compute device selection
pub mod device;

/// Startup construction of both pipelines
pub mod loader;
