// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores VAE parameters using Burn's recorders.
//
// What gets saved:
//   1. Model weights (epoch_<n>.mpk) — encoder and decoder parameters
//   2. latest_epoch.json             — which epoch was last saved
//   3. vae_config.json               — layer widths (D, H1, Z)
//   4. train_config.json             — the full run configuration
//
// The recorder is NamedMpkFileRecorder with full precision, so
// weights come back bit-identical. No architecture version is
// stored: loading into a model of different shape is the caller's
// mistake to avoid.
//
// File naming convention:
//   <output_dir>/checkpoints/
//     epoch_5.mpk
//     epoch_10.mpk
//     latest_epoch.json
//     vae_config.json
//     train_config.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{Vae, VaeConfig};

type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Manages saving and loading of model checkpoints in one directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing checkpoint directory without creating it.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of an epoch's weights, without the extension the recorder adds.
    fn epoch_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("epoch_{epoch}"))
    }

    /// Save model weights keyed by epoch and move the latest pointer.
    pub fn save_model<B: Backend>(&self, model: &Vae<B>, epoch: usize) -> Result<()> {
        let path = self.epoch_path(epoch);

        CheckpointRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load weights into `model` from `epoch`, or from the latest
    /// checkpoint when `epoch` is None.
    pub fn load_model<B: Backend>(
        &self,
        model:  Vae<B>,
        epoch:  Option<usize>,
        device: &B::Device,
    ) -> Result<Vae<B>> {
        let epoch = match epoch {
            Some(e) => e,
            None    => self.latest_epoch()?,
        };
        let path = self.epoch_path(epoch);

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_model_config(&self, cfg: &VaeConfig) -> Result<()> {
        let path = self.dir.join("vae_config.json");
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))
    }

    pub fn load_model_config(&self) -> Result<VaeConfig> {
        let path = self.dir.join("vae_config.json");
        VaeConfig::load(&path).map_err(|e| {
            anyhow::anyhow!("Cannot read model config from '{}': {:?}", path.display(), e)
        })
    }

    /// Save the run configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Read latest_epoch.json and return the epoch number.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_epoch.json'. \
                 Have you run 'train' first?"
            })?;

        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
