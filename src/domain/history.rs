// ============================================================
// Layer 3 — Loss History
// ============================================================
// Per-epoch average losses of one training run. Append-only:
// one train value and one validation value per completed epoch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    train: Vec<f64>,
    val:   Vec<f64>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_train(&mut self, loss: f64) {
        self.train.push(loss);
    }

    pub fn push_val(&mut self, loss: f64) {
        self.val.push(loss);
    }

    pub fn train(&self) -> &[f64] {
        &self.train
    }

    pub fn val(&self) -> &[f64] {
        &self.val
    }

    /// Number of epochs with both a train and a validation value
    pub fn completed_epochs(&self) -> usize {
        self.train.len().min(self.val.len())
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.val.is_empty()
    }

    /// Epoch number (1-based) with the lowest validation loss
    pub fn best_epoch(&self) -> Option<usize> {
        self.val
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i + 1)
    }
}
