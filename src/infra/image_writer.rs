// ============================================================
// Layer 6 — Image Grid Writer
// ============================================================
// Tiles flat CHW pixel buffers into one PNG per call:
//
//   reconstruction_<epoch>.png   originals row above reconstructions row
//   sample_<epoch>.png           decoded prior draws, SAMPLE_COLUMNS wide
//
// Tiles are separated by GRID_PADDING black pixels. One channel
// is written as 8-bit grayscale, three channels as 8-bit RGB.
//
// Reference: image crate documentation (ImageBuffer)

use anyhow::{bail, Context, Result};
use image::{GrayImage, RgbImage};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::planar_to_interleaved;
use crate::domain::image::ImageDims;
use crate::domain::traits::ArtifactSink;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};

pub const GRID_PADDING:   usize = 2;
pub const SAMPLE_COLUMNS: usize = 8;

pub struct ImageGridWriter {
    dir: PathBuf,
}

impl ImageGridWriter {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create image directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Write `count` images from `pixels` as a grid `columns` wide.
    pub fn write_grid(
        &self,
        name:    &str,
        pixels:  &[f32],
        count:   usize,
        dims:    ImageDims,
        columns: usize,
    ) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let (w, h, buf) = tile(pixels, count, dims, columns)?;

        let saved = match dims.channels {
            1 => GrayImage::from_raw(w, h, buf).map(|img| img.save(&path)),
            _ => RgbImage::from_raw(w, h, buf).map(|img| img.save(&path)),
        };
        match saved {
            Some(result) => result.with_context(|| format!("Cannot write '{}'", path.display()))?,
            None => bail!("grid buffer does not match {w}x{h}"),
        }

        tracing::debug!("Wrote {} images to '{}'", count, path.display());
        Ok(path)
    }
}

/// Lay `count` images out row-major in a padded grid.
/// Returns (width, height, interleaved bytes).
fn tile(pixels: &[f32], count: usize, dims: ImageDims, columns: usize) -> Result<(u32, u32, Vec<u8>)> {
    let d = dims.flat_len();
    if count == 0 || columns == 0 {
        bail!("cannot tile an empty grid");
    }
    if pixels.len() < count * d {
        bail!("expected {} values for {} images of {}, got {}", count * d, count, dims, pixels.len());
    }

    let c    = dims.channels;
    let cols = columns.min(count);
    let rows = count.div_ceil(cols);
    let grid_w = cols * (dims.width + GRID_PADDING) + GRID_PADDING;
    let grid_h = rows * (dims.height + GRID_PADDING) + GRID_PADDING;
    let mut buf = vec![0u8; grid_w * grid_h * c];

    for (k, image) in pixels.chunks_exact(d).take(count).enumerate() {
        let bytes = planar_to_interleaved(image, dims);
        let x0 = GRID_PADDING + (k % cols) * (dims.width + GRID_PADDING);
        let y0 = GRID_PADDING + (k / cols) * (dims.height + GRID_PADDING);
        for y in 0..dims.height {
            let src = &bytes[y * dims.width * c..(y + 1) * dims.width * c];
            let dst = ((y0 + y) * grid_w + x0) * c;
            buf[dst..dst + src.len()].copy_from_slice(src);
        }
    }
    Ok((grid_w as u32, grid_h as u32, buf))
}

// ─── RunArtifacts ─────────────────────────────────────────────────────────────
/// File-backed [`ArtifactSink`] for a training run.
pub struct RunArtifacts {
    images:  ImageGridWriter,
    metrics: MetricsLogger,
}

impl RunArtifacts {
    /// Images go to `<output_dir>/images`, the CSV to `<output_dir>`.
    pub fn create(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        Ok(Self {
            images:  ImageGridWriter::new(output_dir.join("images"))?,
            metrics: MetricsLogger::create(output_dir)?,
        })
    }

    pub fn metrics(&self) -> &MetricsLogger {
        &self.metrics
    }
}

impl ArtifactSink for RunArtifacts {
    fn save_reconstructions(
        &self,
        epoch:           usize,
        originals:       &[f32],
        reconstructions: &[f32],
        count:           usize,
        dims:            ImageDims,
    ) -> Result<()> {
        let d = dims.flat_len();
        let mut both = Vec::with_capacity(2 * count * d);
        both.extend_from_slice(&originals[..count * d]);
        both.extend_from_slice(&reconstructions[..count * d]);
        self.images
            .write_grid(&format!("reconstruction_{epoch}.png"), &both, 2 * count, dims, count)
            .map(|_| ())
    }

    fn save_samples(&self, epoch: usize, samples: &[f32], count: usize, dims: ImageDims) -> Result<()> {
        self.images
            .write_grid(&format!("sample_{epoch}.png"), samples, count, dims, SAMPLE_COLUMNS)
            .map(|_| ())
    }

    fn record_epoch(&self, epoch: usize, train_loss: f64, val_loss: f64) -> Result<()> {
        self.metrics.log(&EpochMetrics::new(epoch, train_loss, val_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_size_includes_padding() {
        let dims = ImageDims::new(1, 4, 4);
        let (w, h, buf) = tile(&vec![1.0; 5 * 16], 5, dims, 3).unwrap();
        assert_eq!(w, 3 * 6 + 2);
        assert_eq!(h, 2 * 6 + 2);
        assert_eq!(buf.len(), (w * h) as usize);
        // top-left corner is padding, first pixel of the first tile is white
        assert_eq!(buf[0], 0);
        assert_eq!(buf[(2 * w + 2) as usize], 255);
    }

    #[test]
    fn test_too_few_values_is_an_error() {
        assert!(tile(&[0.0; 10], 1, ImageDims::new(1, 4, 4), 1).is_err());
    }

    #[test]
    fn test_writes_png_files() {
        let tmp  = tempfile::tempdir().unwrap();
        let sink = RunArtifacts::create(tmp.path()).unwrap();
        let dims = ImageDims::new(3, 4, 4);

        sink.save_samples(1, &vec![0.5; 4 * 48], 4, dims).unwrap();
        sink.save_reconstructions(1, &vec![0.0; 2 * 48], &vec![1.0; 2 * 48], 2, dims).unwrap();
        sink.record_epoch(1, 2.0, 3.0).unwrap();

        let sample = image::open(tmp.path().join("images/sample_1.png")).unwrap();
        assert_eq!(sample.width() as usize, 4 * 6 + 2);
        let recon = image::open(tmp.path().join("images/reconstruction_1.png")).unwrap();
        assert_eq!(recon.height() as usize, 2 * 6 + 2);
        assert!(tmp.path().join("loss_history.csv").exists());
    }
}
