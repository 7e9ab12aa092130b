// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by the training loop and the
// inference commands:
//
//   checkpoint.rs   — Saving and loading model weights per epoch,
//                     plus the model and run configurations as JSON
//
//   metrics.rs      — Loss history CSV (one row per epoch)
//
//   image_writer.rs — PNG grids of reconstructions and prior samples,
//                     and the file-backed ArtifactSink for a run
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Loss history CSV logger
pub mod metrics;

/// Image grids and run artifacts
pub mod image_writer;
