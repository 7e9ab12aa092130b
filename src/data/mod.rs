// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from image files on disk all the
// way to tensor batches.
//
// The pipeline flows in this order:
//
//   data_dir/<class>/*.png
//       │
//       ▼
//   ImageFolderLoader → walks class folders, decodes files
//       │
//       ▼
//   ImageTransform    → resize, grayscale/RGB, CHW, scale to [0,1]
//       │
//       ▼
//   split_by_class    → whole classes to train or validation
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher      → stacks images into [N, D] tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads class folders of images from disk
pub mod loader;

/// Resizes and normalises decoded images
pub mod preprocessor;

/// Implements Burn's Dataset trait for decoded images
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded class-level and item-level train/validation splits
pub mod splitter;
