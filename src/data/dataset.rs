use burn::data::dataset::Dataset;

use crate::domain::error::ConfigError;
use crate::domain::image::{ImageDims, ImageItem};

/// In-memory split of decoded images.
pub struct ImageDataset {
    items: Vec<ImageItem>,
}

impl ImageDataset {
    pub fn new(items: Vec<ImageItem>) -> Self { Self { items } }

    /// Every image must flatten to exactly D = C * H * W values.
    pub fn check_width(&self, dims: ImageDims) -> Result<(), ConfigError> {
        let expected = dims.flat_len();
        match self.items.iter().find(|item| item.pixels.len() != expected) {
            Some(item) => Err(ConfigError::WidthMismatch {
                expected,
                actual:      item.pixels.len(),
                source_name: item.source.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Dataset<ImageItem> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
