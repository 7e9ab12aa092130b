// ============================================================
// Layer 5 — Sampler
// ============================================================
// Inference on a trained checkpoint:
//
//   sample      — decode draws from the standard prior
//   reconstruct — encode → reparameterize → decode real images
//
// The model is rebuilt from vae_config.json and its weights are
// loaded from the requested (or latest) epoch. Runs on a plain
// Backend, never an autodiff one.

use anyhow::Result;
use burn::{prelude::*, tensor::TensorData};

use crate::domain::{
    error::ConfigError,
    image::{ImageDims, ImageItem},
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    model::Vae,
    sampling::{to_pixels, NoiseSource},
    trainer::sample_prior,
};

pub struct Sampler<B: Backend> {
    model:  Vae<B>,
    dims:   ImageDims,
    device: B::Device,
}

impl<B: Backend> Sampler<B> {
    pub fn new(model: Vae<B>, dims: ImageDims, device: B::Device) -> Self {
        Self { model, dims, device }
    }

    pub fn from_checkpoint(
        ckpt:   &CheckpointManager,
        epoch:  Option<usize>,
        device: B::Device,
    ) -> Result<Self> {
        let run_cfg   = ckpt.load_config()?;
        let model_cfg = ckpt.load_model_config()?;
        let dims      = run_cfg.dims();

        if model_cfg.input_dim != dims.flat_len() {
            return Err(ConfigError::WidthMismatch {
                expected:    dims.flat_len(),
                actual:      model_cfg.input_dim,
                source_name: "vae_config.json".to_string(),
            }
            .into());
        }

        let model = ckpt.load_model(model_cfg.init::<B>(&device), epoch, &device)?;
        tracing::info!("Model loaded from checkpoint ({} images, latent={})", dims, model_cfg.latent_dim);
        Ok(Self::new(model, dims, device))
    }

    pub fn dims(&self) -> ImageDims {
        self.dims
    }

    /// `count` generated images, flat CHW, values in [0,1].
    pub fn sample(&self, count: usize, noise: &mut NoiseSource) -> Result<Vec<f32>> {
        to_pixels(sample_prior(&self.model, noise, count, &self.device))
    }

    /// Reconstructions of `items`, in order, flat CHW.
    pub fn reconstruct(&self, items: &[ImageItem], noise: &mut NoiseSource) -> Result<Vec<f32>> {
        let d = self.dims.flat_len();
        if let Some(bad) = items.iter().find(|i| i.pixels.len() != d) {
            return Err(ConfigError::WidthMismatch {
                expected:    d,
                actual:      bad.pixels.len(),
                source_name: bad.source.clone(),
            }
            .into());
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let n    = items.len();
        let flat: Vec<f32> = items.iter().flat_map(|i| i.pixels.iter().copied()).collect();
        let x    = Tensor::<B, 2>::from_data(TensorData::new(flat, [n, d]), &self.device);
        let eps  = noise.standard_normal::<B>(n, self.model.latent_dim, &self.device);

        to_pixels(self.model.forward(x, eps).reconstruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::model::VaeConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn saved_run(dir: &std::path::Path) -> CheckpointManager {
        let cfg  = TrainConfig { channels: 1, height: 4, width: 4, latent_dim: 2, ..TrainConfig::default() };
        let ckpt = CheckpointManager::new(dir).unwrap();
        let model_cfg = VaeConfig::new(16, 8, 2);
        let model: Vae<TestBackend> = model_cfg.init(&Default::default());
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_model_config(&model_cfg).unwrap();
        ckpt.save_model(&model, 1).unwrap();
        ckpt
    }

    #[test]
    fn test_sample_from_checkpoint() {
        let tmp     = tempfile::tempdir().unwrap();
        let ckpt    = saved_run(tmp.path());
        let sampler = Sampler::<TestBackend>::from_checkpoint(&ckpt, None, Default::default()).unwrap();

        let pixels = sampler.sample(64, &mut NoiseSource::new(0)).unwrap();
        assert_eq!(pixels.len(), 64 * 16);
        assert!(pixels.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_reconstruct_checks_width() {
        let tmp     = tempfile::tempdir().unwrap();
        let ckpt    = saved_run(tmp.path());
        let sampler = Sampler::<TestBackend>::from_checkpoint(&ckpt, Some(1), Default::default()).unwrap();

        let good = vec![ImageItem::new("a.png", 0, vec![0.5; 16]); 3];
        assert_eq!(sampler.reconstruct(&good, &mut NoiseSource::new(1)).unwrap().len(), 48);

        let bad = vec![ImageItem::new("b.png", 0, vec![0.5; 12])];
        assert!(sampler.reconstruct(&bad, &mut NoiseSource::new(1)).is_err());
    }

    #[test]
    fn test_mismatched_model_config_is_rejected() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = saved_run(tmp.path());
        ckpt.save_model_config(&VaeConfig::new(32, 8, 2)).unwrap();
        assert!(Sampler::<TestBackend>::from_checkpoint(&ckpt, None, Default::default()).is_err());
    }
}
