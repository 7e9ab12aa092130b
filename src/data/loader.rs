// ============================================================
// Layer 4 — Image Folder Loader
// ============================================================
// Loads images from a directory tree using the image crate.
//
// Expected layout (one sub-directory per class):
//
//   data/
//     cats/
//       001.png
//       002.jpg
//     dogs/
//       001.png
//
// Image files placed directly in the root are grouped into one
// extra class named after the root directory. Directory entries
// are sorted so the class and item order is deterministic.
//
// Reference: image crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::ImageTransform;
use crate::domain::image::{ImageClass, ImageItem};
use crate::domain::traits::ImageSource;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Loads every image below a root directory, one class per sub-directory.
pub struct ImageFolderLoader {
    dir:       String,
    transform: ImageTransform,
}

impl ImageFolderLoader {
    pub fn new(dir: impl Into<String>, transform: ImageTransform) -> Self {
        Self { dir: dir.into(), transform }
    }

    /// Decode all image files directly inside `dir` (not recursive).
    fn load_dir(&self, dir: &Path, label: usize) -> Result<Vec<ImageItem>> {
        let mut items = Vec::new();
        for path in sorted_entries(dir)? {
            if !path.is_file() || !is_image(&path) {
                continue;
            }
            match load_single_image(&path, label, &self.transform) {
                Ok(item) => items.push(item),
                // A bad file is skipped; the rest of the class still loads
                Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
            }
        }
        Ok(items)
    }
}

impl ImageSource for ImageFolderLoader {
    fn load_classes(&self) -> Result<Vec<ImageClass>> {
        let root = Path::new(&self.dir);

        if !root.exists() {
            tracing::warn!("Data directory '{}' does not exist — returning empty corpus", self.dir);
            return Ok(Vec::new());
        }

        let mut classes = Vec::new();

        let subdirs: Vec<PathBuf> = sorted_entries(root)?
            .into_iter()
            .filter(|p| p.is_dir())
            .collect();

        for dir in subdirs {
            let label = classes.len();
            let items = self.load_dir(&dir, label)?;
            if items.is_empty() {
                tracing::debug!("Class directory '{}' has no images", dir.display());
                continue;
            }
            classes.push(ImageClass::new(file_name(&dir), items));
        }

        let loose = self.load_dir(root, classes.len())?;
        if !loose.is_empty() {
            classes.push(ImageClass::new(file_name(root), loose));
        }

        let total: usize = classes.iter().map(ImageClass::len).sum();
        tracing::info!("Loaded {} images in {} classes from '{}'", total, classes.len(), self.dir);
        Ok(classes)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        paths.push(entry?.path());
    }
    paths.sort();
    Ok(paths)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Decode one file and run it through the transform.
fn load_single_image(path: &Path, label: usize, transform: &ImageTransform) -> Result<ImageItem> {
    let img = image::open(path)
        .with_context(|| format!("Cannot decode '{}'", path.display()))?;
    Ok(ImageItem::new(file_name(path), label, transform.apply(&img)))
}
