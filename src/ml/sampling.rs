// ============================================================
// Layer 5 — Reparameterization and Noise
// ============================================================
// z = mu + eps * exp(0.5 * logvar),   eps ~ N(0, I)
//
// The randomness lives entirely in eps, which is created from
// plain data and therefore carries no autodiff history. Gradients
// reach mu and logvar through the arithmetic above while eps is
// an opaque constant input.
//
// NoiseSource owns a seeded StdRng and draws a fresh eps tensor
// on every call. Generation mode bypasses the encoder and feeds
// a prior draw straight into the decoder.
//
// Reference: Kingma & Welling (2014) Auto-Encoding Variational Bayes

use burn::{prelude::*, tensor::TensorData};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Differentiable latent sample from (mu, logvar) and externally drawn noise.
pub fn reparameterize<B: Backend>(
    mu:     Tensor<B, 2>,
    logvar: Tensor<B, 2>,
    eps:    Tensor<B, 2>,
) -> Tensor<B, 2> {
    let std = logvar.mul_scalar(0.5).exp();
    mu + eps * std
}

/// Seeded source of standard-normal noise.
pub struct NoiseSource {
    rng: StdRng,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// A new [rows, cols] tensor of independent N(0,1) draws.
    pub fn standard_normal<B: Backend>(
        &mut self,
        rows:   usize,
        cols:   usize,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        let data: Vec<f32> = (0..rows * cols)
            .map(|_| self.rng.sample::<f32, _>(StandardNormal))
            .collect();
        Tensor::from_data(TensorData::new(data, [rows, cols]), device)
    }

    /// `count` latent vectors drawn from the standard prior.
    pub fn prior<B: Backend>(
        &mut self,
        count:      usize,
        latent_dim: usize,
        device:     &B::Device,
    ) -> Tensor<B, 2> {
        self.standard_normal(count, latent_dim, device)
    }
}

/// Copy a tensor back to the host as flat f32 pixels.
pub fn to_pixels<B: Backend, const D: usize>(t: Tensor<B, D>) -> anyhow::Result<Vec<f32>> {
    t.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {:?}", e))
}
