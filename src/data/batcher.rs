// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ImageItem> into
// tensors for one mini-batch.
//
//   Input:  Vec of N ImageItems, each with D = C*H*W pixels
//   Output: ImageBatch with images [N, D] and labels [N]
//
// This is where the flattened view is produced: every image is
// already stored as a flat CHW vector, so batching is a single
// concatenation followed by a reshape. The final batch of an
// epoch may hold fewer than batch_size images.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::domain::image::ImageItem;

/// A batch of flattened images.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Flattened images — shape: [batch_size, D], values in [0,1]
    pub images: Tensor<B, 2>,

    /// Class indices — shape: [batch_size]. Not used by the model.
    #[allow(dead_code)]
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> ImageBatch<B> {
    pub fn len(&self) -> usize {
        self.images.dims()[0]
    }
}

/// Holds the target device so tensors are created in the right place.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        // run_training checks widths against D before any loader is built
        let width = items.first().map(|i| i.pixels.len()).unwrap_or(0);

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();

        let labels: Vec<i32> = items.iter().map(|item| item.label as i32).collect();

        let images = Tensor::<B, 2>::from_data(
            TensorData::new(flat, [batch_size, width]),
            &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, labels }
    }
}
