// ============================================================
// Layer 5 — ELBO Loss
// ============================================================
// Negative evidence lower bound for one batch:
//
//   BCE = -Σ [ x·log(x̂) + (1−x)·log(1−x̂) ]        over N × D
//   KL  = -0.5 · Σ [ 1 + logvar − mu² − exp(logvar) ] over N × Z
//   loss = BCE + beta · KL                           (beta = 1 by default)
//
// Both terms are SUMS over batch and features. Dividing by the
// number of examples is the training loop's job.
//
// x̂ is clamped to [RECON_EPSILON, 1 − RECON_EPSILON] before the
// logs so an exactly saturated sigmoid can never produce ±inf.
//
// Reference: Kingma & Welling (2014), Appendix B

use burn::prelude::*;

pub const RECON_EPSILON: f32 = 1e-7;

/// The scalar loss and its two terms, each of shape [1].
pub struct LossParts<B: Backend> {
    pub total:          Tensor<B, 1>,
    pub reconstruction: Tensor<B, 1>,
    pub kl:             Tensor<B, 1>,
}

/// Summed binary cross-entropy. `input` is reshaped to the
/// reconstruction's [N, D] shape.
pub fn reconstruction_bce<B: Backend>(
    reconstruction: Tensor<B, 2>,
    input:          Tensor<B, 2>,
) -> Tensor<B, 1> {
    let x = input.reshape(reconstruction.dims());
    let r = reconstruction.clamp(RECON_EPSILON, 1.0 - RECON_EPSILON);

    let log_r     = r.clone().log();
    let log_1m_r  = r.neg().add_scalar(1.0).log();
    let one_m_x   = x.clone().neg().add_scalar(1.0);

    (x * log_r + one_m_x * log_1m_r).sum().neg()
}

/// Closed-form KL(N(mu, exp(logvar)) || N(0, I)), summed.
pub fn kl_divergence<B: Backend>(mu: Tensor<B, 2>, logvar: Tensor<B, 2>) -> Tensor<B, 1> {
    let inner = logvar.clone().add_scalar(1.0) - mu.powf_scalar(2.0) - logvar.exp();
    inner.sum().mul_scalar(-0.5)
}

pub fn elbo_loss<B: Backend>(
    reconstruction: Tensor<B, 2>,
    input:          Tensor<B, 2>,
    mu:             Tensor<B, 2>,
    logvar:         Tensor<B, 2>,
    beta:           f64,
) -> LossParts<B> {
    let bce = reconstruction_bce(reconstruction, input);
    let kl  = kl_divergence(mu, logvar);
    let total = bce.clone() + kl.clone().mul_scalar(beta);
    LossParts { total, reconstruction: bce, kl }
}

/// Read a [1]-shaped loss tensor back as f64.
pub fn scalar<B: Backend>(t: Tensor<B, 1>) -> f64 {
    t.into_scalar().elem::<f64>()
}
