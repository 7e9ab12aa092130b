// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration     (fatal before any I/O)
//   Step 2: Load class folders of images   (Layer 4 - data)
//   Step 3: Split train/validation by class (Layer 4 - data)
//   Step 4: Build datasets + width check   (Layer 4 - data)
//   Step 5: Save configs                   (Layer 6 - infra)
//   Step 6: Run training loop              (Layer 5 - ml)
//   Step 7: Persist the loss history       (Layer 6 - infra)
//
// Output layout:
//   <output_dir>/checkpoints/   weights + JSON configs
//   <output_dir>/images/        reconstruction_<n>.png, sample_<n>.png
//   <output_dir>/loss_history.csv
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    dataset::ImageDataset,
    loader::ImageFolderLoader,
    preprocessor::ImageTransform,
    splitter::split_by_class,
};
use crate::domain::{
    error::ConfigError,
    history::LossHistory,
    image::ImageDims,
    traits::ImageSource,
};
use crate::infra::{checkpoint::CheckpointManager, image_writer::RunArtifacts};
use crate::ml::{model::VaeConfig, trainer::run_training, TrainBackend};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved next to the checkpoints and
// reloaded for sampling and reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:            String,
    pub output_dir:          String,
    pub epochs:              usize,
    pub batch_size:          usize,
    pub latent_dim:          usize,
    pub hidden_width:        usize,
    pub channels:            usize,
    pub height:              usize,
    pub width:               usize,
    pub checkpoint_interval: usize,
    pub learning_rate:       f64,
    pub random_seed:         u64,
    pub beta:                f64,
    pub val_fraction:        f64,
    pub sample_count:        usize,
    pub comparison_count:    usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:            "data/images".to_string(),
            output_dir:          "runs/vae".to_string(),
            epochs:              20,
            batch_size:          64,
            latent_dim:          20,
            hidden_width:        400,
            channels:            1,
            height:              28,
            width:               28,
            checkpoint_interval: 5,
            learning_rate:       1e-3,
            random_seed:         42,
            beta:                1.0,
            val_fraction:        0.2,
            sample_count:        64,
            comparison_count:    8,
        }
    }
}

impl TrainConfig {
    pub fn dims(&self) -> ImageDims {
        ImageDims::new(self.channels, self.height, self.width)
    }

    /// Reject every configuration that could not train. `epochs = 0` is allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("batch_size",          self.batch_size),
            ("latent_dim",          self.latent_dim),
            ("hidden_width",        self.hidden_width),
            ("checkpoint_interval", self.checkpoint_interval),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::NonPositive { field });
        }

        self.dims().validate()?;

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::NonPositive { field: "learning_rate" });
        }
        if !(self.val_fraction > 0.0 && self.val_fraction < 1.0) {
            return Err(ConfigError::InvalidFraction { field: "val_fraction", value: self.val_fraction });
        }
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(ConfigError::InvalidBeta { value: self.beta });
        }
        Ok(())
    }

    /// Layer widths of the model this configuration trains.
    pub fn model_config(&self) -> VaeConfig {
        VaeConfig::new(self.dims().flat_len(), self.hidden_width, self.latent_dim)
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        Path::new(&self.output_dir).join("checkpoints")
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on `data_dir` with the default backend.
    pub fn execute(&self) -> Result<LossHistory> {
        self.config.validate()?;
        let loader = ImageFolderLoader::new(
            self.config.data_dir.clone(),
            ImageTransform::new(self.config.dims()),
        );
        self.execute_with::<TrainBackend>(&loader, Default::default())
    }

    /// Train on any image source and backend.
    pub fn execute_with<B: AutodiffBackend>(
        &self,
        source: &dyn ImageSource,
        device: B::Device,
    ) -> Result<LossHistory> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;
        let dims = cfg.dims();

        // ── Step 2: Load images ───────────────────────────────────────────────
        tracing::info!("Loading {} images from '{}'", dims, cfg.data_dir);
        let classes = source.load_classes()?;
        tracing::info!(
            "Loaded {} images in {} classes",
            classes.iter().map(|c| c.len()).sum::<usize>(),
            classes.len()
        );

        // ── Step 3: Train / validation split ──────────────────────────────────
        let (train_items, val_items) = split_by_class(classes, cfg.val_fraction, cfg.random_seed);
        tracing::info!("Split: {} train, {} validation", train_items.len(), val_items.len());

        if train_items.is_empty() {
            return Err(ConfigError::EmptySplit { split: "train" }.into());
        }
        if val_items.is_empty() {
            return Err(ConfigError::EmptySplit { split: "validation" }.into());
        }

        // ── Step 4: Build datasets ────────────────────────────────────────────
        let train_dataset = ImageDataset::new(train_items);
        let val_dataset   = ImageDataset::new(val_items);
        train_dataset.check_width(dims)?;
        val_dataset.check_width(dims)?;

        // ── Step 5: Save configs for inference ────────────────────────────────
        let ckpt = CheckpointManager::new(cfg.checkpoint_dir())?;
        ckpt.save_config(cfg)?;
        ckpt.save_model_config(&cfg.model_config())?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        let artifacts = RunArtifacts::create(&cfg.output_dir)?;
        let (_, history) = run_training::<B>(
            cfg, train_dataset, val_dataset, Some(&ckpt), &artifacts, device,
        )?;

        // ── Step 7: Final loss history ────────────────────────────────────────
        match artifacts.metrics().write_history(&history) {
            Ok(()) => tracing::info!(
                "Loss history written to '{}'",
                artifacts.metrics().csv_path().display()
            ),
            Err(e) => tracing::error!("Loss history not written: {:#}", e),
        }

        Ok(history)
    }
}
