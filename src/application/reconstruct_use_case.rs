// ============================================================
// Layer 2 — ReconstructUseCase
// ============================================================
// Loads a checkpoint, reconstructs up to `count` images from a
// folder tree and writes originals above reconstructions.
//
// Images are resized to the dims the model was trained on, so
// any folder of pictures can be fed in.

use anyhow::{bail, Result};
use burn::prelude::Backend;
use std::path::{Path, PathBuf};

use crate::data::{loader::ImageFolderLoader, preprocessor::ImageTransform};
use crate::domain::{image::ImageItem, traits::ImageSource};
use crate::infra::{checkpoint::CheckpointManager, image_writer::ImageGridWriter};
use crate::ml::{sampler::Sampler, sampling::NoiseSource, InferBackend};

pub struct ReconstructUseCase {
    output_dir: String,
    epoch:      Option<usize>,
}

impl ReconstructUseCase {
    pub fn new(output_dir: String, epoch: Option<usize>) -> Self {
        Self { output_dir, epoch }
    }

    pub fn execute(&self, input_dir: &str, count: usize, seed: u64, file_name: &str) -> Result<PathBuf> {
        self.execute_with::<InferBackend>(input_dir, count, seed, file_name, Default::default())
    }

    pub fn execute_with<B: Backend>(
        &self,
        input_dir: &str,
        count:     usize,
        seed:      u64,
        file_name: &str,
        device:    B::Device,
    ) -> Result<PathBuf> {
        let root    = Path::new(&self.output_dir);
        let ckpt    = CheckpointManager::open(root.join("checkpoints"));
        let sampler = Sampler::<B>::from_checkpoint(&ckpt, self.epoch, device)?;
        let dims    = sampler.dims();

        let loader = ImageFolderLoader::new(input_dir, ImageTransform::new(dims));
        let items: Vec<ImageItem> = loader
            .load_classes()?
            .into_iter()
            .flat_map(|c| c.items)
            .take(count)
            .collect();
        if items.is_empty() {
            bail!("No images found in '{}'", input_dir);
        }

        let n = items.len();
        let recon = sampler.reconstruct(&items, &mut NoiseSource::new(seed))?;

        let mut grid: Vec<f32> = items.into_iter().flat_map(|i| i.pixels).collect();
        grid.extend(recon);

        let writer = ImageGridWriter::new(root.join("images"))?;
        let path   = writer.write_grid(file_name, &grid, 2 * n, dims, n)?;

        tracing::info!("Wrote {} reconstructions to '{}'", n, path.display());
        Ok(path)
    }
}
