// ============================================================
// Layer 2 — SampleUseCase
// ============================================================
// Generation mode: load a trained checkpoint, decode `count`
// draws from the standard prior and write them as one grid.

use anyhow::Result;
use burn::prelude::Backend;
use std::path::{Path, PathBuf};

use crate::domain::error::ConfigError;
use crate::infra::{
    checkpoint::CheckpointManager,
    image_writer::{ImageGridWriter, SAMPLE_COLUMNS},
};
use crate::ml::{sampler::Sampler, sampling::NoiseSource, InferBackend};

pub struct SampleUseCase {
    output_dir: String,
    epoch:      Option<usize>,
}

impl SampleUseCase {
    /// `epoch = None` uses the latest checkpoint.
    pub fn new(output_dir: String, epoch: Option<usize>) -> Self {
        Self { output_dir, epoch }
    }

    pub fn execute(&self, count: usize, seed: u64, file_name: &str) -> Result<PathBuf> {
        self.execute_with::<InferBackend>(count, seed, file_name, Default::default())
    }

    pub fn execute_with<B: Backend>(
        &self,
        count:     usize,
        seed:      u64,
        file_name: &str,
        device:    B::Device,
    ) -> Result<PathBuf> {
        if count == 0 {
            return Err(ConfigError::NonPositive { field: "count" }.into());
        }

        let root    = Path::new(&self.output_dir);
        let ckpt    = CheckpointManager::open(root.join("checkpoints"));
        let sampler = Sampler::<B>::from_checkpoint(&ckpt, self.epoch, device)?;

        let pixels = sampler.sample(count, &mut NoiseSource::new(seed))?;
        let writer = ImageGridWriter::new(root.join("images"))?;
        let path   = writer.write_grid(file_name, &pixels, count, sampler.dims(), SAMPLE_COLUMNS)?;

        tracing::info!("Wrote {} samples to '{}'", count, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::ml::model::Vae;
    use burn::backend::NdArray;

    #[test]
    fn test_sample_grid_written() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            output_dir: tmp.path().display().to_string(),
            height: 4, width: 4, latent_dim: 2, hidden_width: 8,
            ..TrainConfig::default()
        };
        let ckpt = CheckpointManager::new(cfg.checkpoint_dir()).unwrap();
        let model: Vae<NdArray> = cfg.model_config().init(&Default::default());
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_model_config(&cfg.model_config()).unwrap();
        ckpt.save_model(&model, 1).unwrap();

        let path = SampleUseCase::new(cfg.output_dir.clone(), None)
            .execute_with::<NdArray>(16, 7, "generated.png", Default::default())
            .unwrap();
        let img = image::open(path).unwrap();
        assert_eq!(img.width() as usize, 8 * 6 + 2);
        assert_eq!(img.height() as usize, 2 * 6 + 2);
    }

    #[test]
    fn test_missing_checkpoint_reports_error() {
        let tmp = tempfile::tempdir().unwrap();
        let res = SampleUseCase::new(tmp.path().display().to_string(), None)
            .execute_with::<NdArray>(4, 0, "generated.png", Default::default());
        assert!(res.is_err());
    }
}
