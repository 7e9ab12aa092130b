// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Splits loaded images into two sets:
//   - Training set:   used to update model weights
//   - Validation set: held out, used only to measure loss
//
// The split is made at the class (folder) level: whole category
// directories go to one side or the other. With a single class
// there is nothing to split between, so the images of that class
// are split item by item instead.
//
// Both splits shuffle with a seeded StdRng, so the same seed
// always produces the same partition.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::image::{ImageClass, ImageItem};

/// Shuffle `samples` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - Seed for the shuffle
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);

    // Fisher-Yates shuffle — every permutation is equally likely
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

/// Split whole classes into (train, validation) image lists.
///
/// `val_fraction` of the classes (rounded, at least one, never all) are
/// held out. A single class falls back to [`split_train_val`].
pub fn split_by_class(
    mut classes:  Vec<ImageClass>,
    val_fraction: f64,
    seed:         u64,
) -> (Vec<ImageItem>, Vec<ImageItem>) {
    classes.retain(|c| !c.is_empty());

    if classes.len() < 2 {
        let items: Vec<ImageItem> = classes.into_iter().flat_map(|c| c.items).collect();
        tracing::info!("Single class found — splitting {} images item by item", items.len());
        return split_train_val(items, 1.0 - val_fraction, seed);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    classes.shuffle(&mut rng);

    let n_val = ((classes.len() as f64) * val_fraction).round() as usize;
    let n_val = n_val.clamp(1, classes.len() - 1);

    let train_classes = classes.split_off(n_val);
    tracing::info!(
        "Validation classes: {:?}",
        classes.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );

    let val   = classes.into_iter().flat_map(|c| c.items).collect();
    let train = train_classes.into_iter().flat_map(|c| c.items).collect();
    (train, val)
}
