// ============================================================
// Layer 3 — Image Domain Types
// ============================================================
// Plain data structs describing what an image IS to the system:
//
//   ImageDims  — the fixed (C, H, W) shape of every image in a run
//   ImageItem  — one decoded image, flattened CHW, values in [0,1]
//   ImageClass — one category directory and the images inside it
//
// The flattened width D = C * H * W is fixed for the lifetime of a
// model. The encoder input and the decoder output are both D wide.
//
// Reference: Rust Book §5 (Structs and Methods)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Shape of one image as (channels, height, width).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDims {
    /// 1 for grayscale, 3 for RGB
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,
}

impl ImageDims {
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self { channels, height, width }
    }

    /// Length of the flattened view: D = C * H * W
    pub fn flat_len(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Number of pixels in one channel plane
    pub fn plane_len(&self) -> usize {
        self.height * self.width
    }

    /// Reject zero-sized axes and channel counts other than 1 or 3.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.height == 0 {
            return Err(ConfigError::NonPositive { field: "height" });
        }
        if self.width == 0 {
            return Err(ConfigError::NonPositive { field: "width" });
        }
        match self.channels {
            1 | 3 => Ok(()),
            other => Err(ConfigError::UnsupportedChannels { channels: other }),
        }
    }
}

impl fmt::Display for ImageDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.channels, self.height, self.width)
    }
}

/// A decoded image ready for the model.
///
/// `pixels` is laid out channel-major (all of channel 0, then channel 1, ...)
/// and every value lies in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageItem {
    /// File name the image was decoded from
    pub source: String,

    /// Index of the class directory; carried along, never used by the model
    pub label: usize,

    pub pixels: Vec<f32>,
}

impl ImageItem {
    pub fn new(source: impl Into<String>, label: usize, pixels: Vec<f32>) -> Self {
        Self { source: source.into(), label, pixels }
    }
}

/// All images found in one category directory.
#[derive(Debug, Clone)]
pub struct ImageClass {
    pub name:  String,
    pub items: Vec<ImageItem>,
}

impl ImageClass {
    pub fn new(name: impl Into<String>, items: Vec<ImageItem>) -> Self {
        Self { name: name.into(), items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_len() {
        assert_eq!(ImageDims::new(1, 28, 28).flat_len(), 784);
        assert_eq!(ImageDims::new(3, 4, 4).flat_len(), 48);
    }

    #[test]
    fn test_rejects_two_channels() {
        let err = ImageDims::new(2, 8, 8).validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedChannels { channels: 2 }));
    }

    #[test]
    fn test_rejects_zero_height() {
        assert!(ImageDims::new(1, 0, 8).validate().is_err());
    }
}
