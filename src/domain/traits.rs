// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the training core and its collaborators:
//
//   ImageSource  — where images come from (a folder tree on disk,
//                  or an in-memory fixture in tests)
//   ArtifactSink — where observational outputs go (reconstruction
//                  grids, prior samples, the loss history)
//
// Neither trait mentions tensors; pixel buffers cross these
// boundaries as flat f32 slices in [0,1].
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::image::{ImageClass, ImageDims};

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can produce labelled images grouped by class.
pub trait ImageSource {
    /// Load every class with its decoded images.
    fn load_classes(&self) -> Result<Vec<ImageClass>>;
}

// ─── ArtifactSink ─────────────────────────────────────────────────────────────
/// Receives per-epoch outputs of a training run.
///
/// Implementations must not panic on I/O failure; the trainer logs the
/// returned error and keeps going.
pub trait ArtifactSink {
    /// `originals` and `reconstructions` each hold `count` images of `dims`.
    fn save_reconstructions(
        &self,
        epoch:           usize,
        originals:       &[f32],
        reconstructions: &[f32],
        count:           usize,
        dims:            ImageDims,
    ) -> Result<()>;

    /// `samples` holds `count` decoded prior draws of `dims`.
    fn save_samples(
        &self,
        epoch:   usize,
        samples: &[f32],
        count:   usize,
        dims:    ImageDims,
    ) -> Result<()>;

    /// Append one row of the loss history.
    fn record_epoch(&self, epoch: usize, train_loss: f64, val_loss: f64) -> Result<()>;
}

/// Sink that discards everything.
#[cfg(test)]
pub struct NullSink;

#[cfg(test)]
impl ArtifactSink for NullSink {
    fn save_reconstructions(
        &self, _: usize, _: &[f32], _: &[f32], _: usize, _: ImageDims,
    ) -> Result<()> {
        Ok(())
    }

    fn save_samples(&self, _: usize, _: &[f32], _: usize, _: ImageDims) -> Result<()> {
        Ok(())
    }

    fn record_epoch(&self, _: usize, _: f64, _: f64) -> Result<()> {
        Ok(())
    }
}
