// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns a decoded image of any size and colour type into the
// fixed-shape tensor layout the model expects.
//
// Steps (applied in order):
//   1. Resize to exactly H x W (triangle filter)
//   2. Convert to grayscale (C = 1) or RGB (C = 3)
//   3. Reorder interleaved HWC bytes into planar CHW
//   4. Scale bytes from 0..=255 into [0,1]
//
// The output is one Vec<f32> of length C * H * W.
//
// Reference: image crate documentation (imageops, DynamicImage)

use image::{imageops::FilterType, DynamicImage};

use crate::domain::image::ImageDims;

pub struct ImageTransform {
    dims: ImageDims,
}

impl ImageTransform {
    pub fn new(dims: ImageDims) -> Self {
        Self { dims }
    }

    /// Resize, convert and normalise one decoded image.
    pub fn apply(&self, img: &DynamicImage) -> Vec<f32> {
        let (w, h) = (self.dims.width as u32, self.dims.height as u32);
        let resized = if img.width() == w && img.height() == h {
            img.clone()
        } else {
            img.resize_exact(w, h, FilterType::Triangle)
        };

        let raw = match self.dims.channels {
            1 => resized.to_luma8().into_raw(),
            _ => resized.to_rgb8().into_raw(),
        };
        interleaved_to_planar(&raw, self.dims)
    }
}

/// Convert interleaved HWC bytes into planar CHW floats in [0,1].
///
/// For a single channel the layouts coincide and this is only a rescale.
pub fn interleaved_to_planar(raw: &[u8], dims: ImageDims) -> Vec<f32> {
    let c     = dims.channels;
    let plane = dims.plane_len();
    let mut out = vec![0.0f32; dims.flat_len()];

    for (i, px) in raw.chunks_exact(c).take(plane).enumerate() {
        for (ch, &byte) in px.iter().enumerate() {
            out[ch * plane + i] = byte as f32 / 255.0;
        }
    }
    out
}

/// Inverse of [`interleaved_to_planar`]: planar CHW floats back to
/// interleaved bytes, clamping anything outside [0,1].
pub fn planar_to_interleaved(pixels: &[f32], dims: ImageDims) -> Vec<u8> {
    let c     = dims.channels;
    let plane = dims.plane_len();
    let mut out = vec![0u8; dims.flat_len()];

    for i in 0..plane {
        for ch in 0..c {
            let v = pixels[ch * plane + i].clamp(0.0, 1.0);
            out[i * c + ch] = (v * 255.0).round() as u8;
        }
    }
    out
}
