// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model, loss and training code.
//
// What's in this layer:
//
//   model.rs    — The VAE architecture
//                 • Encoder: Linear D→H1, ReLU, heads H1→Z (mu, logvar)
//                 • Decoder: Linear Z→H1, ReLU, Linear H1→D, sigmoid
//
//   sampling.rs — Reparameterization and the seeded noise source
//
//   loss.rs     — Negative ELBO: summed BCE + beta · KL
//
//   trainer.rs  — TrainingSession: forward, loss, backward,
//                 optimiser step, evaluation, prior samples and
//                 checkpoints per epoch
//
//   sampler.rs  — Loads a checkpoint, generates and reconstructs
//
// Backends:
//   default        Autodiff<NdArray> for training, NdArray for inference
//   --features wgpu Autodiff<Wgpu>   for training, Wgpu    for inference
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Kingma & Welling (2014) Auto-Encoding Variational Bayes

use burn::tensor::backend::AutodiffBackend;

/// VAE encoder / decoder architecture
pub mod model;

/// Reparameterization trick and noise
pub mod sampling;

/// ELBO loss
pub mod loss;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint, samples and reconstructs
pub mod sampler;

#[cfg(not(feature = "wgpu"))]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

#[cfg(feature = "wgpu")]
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

pub type InferBackend = <TrainBackend as AutodiffBackend>::InnerBackend;
