// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, errors and traits describing the core
// concepts of the system: image shapes, decoded images, the
// configuration error taxonomy, and the collaborator seams.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Image shape, decoded images and class folders
pub mod image;

// Configuration errors raised before training
pub mod error;

// Per-epoch train/validation losses
pub mod history;

// Core abstractions (traits) that other layers implement
pub mod traits;
