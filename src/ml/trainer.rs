// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop for the VAE using Burn's DataLoader and Adam.
//
//   Idle → Epoch(n) → MiniBatch(i)* → Evaluate → Checkpoint?(n)
//        → Epoch(n+1) → ... → Done
//
// Key Burn insight:
//   - Training uses B = Autodiff<...> for gradients
//   - model.valid() returns the same model on B::InnerBackend,
//     so evaluation and sampling cannot track gradients
//   - The validation batcher must also use B::InnerBackend
//
// All state of a run (model, optimizer, noise, loss history)
// lives in one TrainingSession owned by the caller.
//
// A non-finite mini-batch loss ends the run. Artifact and
// checkpoint write failures are logged and training goes on.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{ensure, Context, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
};
use crate::domain::{
    error::ConfigError,
    history::LossHistory,
    image::ImageDims,
    traits::ArtifactSink,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    loss::{elbo_loss, scalar},
    model::Vae,
    sampling::{to_pixels, NoiseSource},
};

// ─── Evaluation ───────────────────────────────────────────────────────────────
/// Held-out loss plus the first batch's comparison images.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub val_loss:        f64,
    pub examples:        usize,
    /// `compared` originals from the first batch, flat CHW
    pub originals:       Vec<f32>,
    pub reconstructions: Vec<f32>,
    pub compared:        usize,
}

/// Run the forward path over `loader` without any parameter update.
///
/// Call with a model obtained from `valid()` so no graph is recorded.
pub fn evaluate<B: Backend>(
    model:   &Vae<B>,
    loader:  &dyn DataLoader<ImageBatch<B>>,
    noise:   &mut NoiseSource,
    beta:    f64,
    compare: usize,
) -> Result<Evaluation> {
    let mut val_loss = 0.0f64;
    let mut examples = 0usize;
    let mut originals       = Vec::new();
    let mut reconstructions = Vec::new();
    let mut compared        = 0usize;

    for batch in loader.iter() {
        let n      = batch.len();
        let device = batch.images.device();
        let eps    = noise.standard_normal::<B>(n, model.latent_dim, &device);
        let out    = model.forward(batch.images.clone(), eps);

        if examples == 0 && compare > 0 {
            let k = compare.min(n);
            originals       = to_pixels(batch.images.clone().slice([0..k, 0..model.input_dim]))?;
            reconstructions = to_pixels(out.reconstruction.clone().slice([0..k, 0..model.input_dim]))?;
            compared        = k;
        }

        let parts = elbo_loss(out.reconstruction, batch.images, out.mu, out.logvar, beta);
        val_loss += scalar(parts.total);
        examples += n;
    }

    if examples == 0 {
        return Err(ConfigError::EmptySplit { split: "validation" }.into());
    }

    Ok(Evaluation {
        val_loss: val_loss / examples as f64,
        examples,
        originals,
        reconstructions,
        compared,
    })
}

/// Decode `count` draws from the standard prior. The encoder is not used.
pub fn sample_prior<B: Backend>(
    model:  &Vae<B>,
    noise:  &mut NoiseSource,
    count:  usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let z = noise.prior::<B>(count, model.latent_dim, device);
    model.decode(z)
}

// ─── TrainingSession ──────────────────────────────────────────────────────────
/// Everything one training run owns.
pub struct TrainingSession<B: AutodiffBackend, O: Optimizer<Vae<B>, B>> {
    model:   Vae<B>,
    optim:   O,
    noise:   NoiseSource,
    history: LossHistory,
    cfg:     TrainConfig,
    device:  B::Device,
}

impl<B: AutodiffBackend, O: Optimizer<Vae<B>, B>> TrainingSession<B, O> {
    /// The noise source is seeded from `cfg.random_seed`.
    pub fn new(model: Vae<B>, optim: O, cfg: TrainConfig, device: B::Device) -> Self {
        Self {
            model,
            optim,
            noise: NoiseSource::new(cfg.random_seed),
            history: LossHistory::new(),
            cfg,
            device,
        }
    }

    pub fn into_parts(self) -> (Vae<B>, LossHistory) {
        (self.model, self.history)
    }

    /// One mini-batch: forward, loss, backward, Adam update.
    /// Returns the summed (not averaged) batch loss.
    pub fn train_step(&mut self, images: Tensor<B, 2>) -> Result<f64> {
        let [n, _] = images.dims();
        let eps = self.noise.standard_normal::<B>(n, self.model.latent_dim, &self.device);
        let out = self.model.forward(images.clone(), eps);

        let parts = elbo_loss(out.reconstruction, images, out.mu, out.logvar, self.cfg.beta);
        let loss  = scalar(parts.total.clone());
        ensure!(loss.is_finite(), "non-finite loss {loss} in mini-batch of {n}");
        tracing::debug!(
            "bce={:.4} kl={:.4}",
            scalar(parts.reconstruction),
            scalar(parts.kl),
        );

        // Backward pass + Adam update
        let grads = parts.total.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(self.cfg.learning_rate, self.model.clone(), grads);

        Ok(loss)
    }

    /// Train on every batch once. Returns summed loss / training examples.
    pub fn train_epoch(&mut self, epoch: usize, loader: &dyn DataLoader<ImageBatch<B>>) -> Result<f64> {
        let mut train_loss = 0.0f64;
        let mut examples   = 0usize;

        for (i, batch) in loader.iter().enumerate() {
            let n = batch.len();
            let loss = self
                .train_step(batch.images)
                .with_context(|| format!("Training failed at epoch {epoch}, batch {i}"))?;

            train_loss += loss;
            examples   += n;
            tracing::info!("epoch {} batch {:>4}: loss/example={:.4}", epoch, i, loss / n as f64);
        }

        if examples == 0 {
            return Err(ConfigError::EmptySplit { split: "train" }.into());
        }
        Ok(train_loss / examples as f64)
    }

    /// Evaluate the current parameters on `loader` in inference mode.
    pub fn evaluate(&mut self, loader: &dyn DataLoader<ImageBatch<B::InnerBackend>>) -> Result<Evaluation> {
        let model = self.model.valid();
        evaluate(&model, loader, &mut self.noise, self.cfg.beta, self.cfg.comparison_count)
    }

    /// Decode prior draws with the current parameters, as host pixels.
    pub fn sample_prior(&mut self, count: usize) -> Result<Vec<f32>> {
        let model = self.model.valid();
        to_pixels(sample_prior(&model, &mut self.noise, count, &self.device))
    }

    /// Run the configured number of epochs. `epochs = 0` returns at once.
    pub fn run(
        &mut self,
        train_loader: &dyn DataLoader<ImageBatch<B>>,
        valid_loader: &dyn DataLoader<ImageBatch<B::InnerBackend>>,
        ckpt:         Option<&CheckpointManager>,
        sink:         &dyn ArtifactSink,
    ) -> Result<()> {
        let epochs = self.cfg.epochs;
        let dims   = self.cfg.dims();

        for epoch in 1..=epochs {
            // ── Training phase ────────────────────────────────────────────────
            let train_loss = self.train_epoch(epoch, train_loader)?;
            self.history.push_train(train_loss);

            // ── Validation phase ──────────────────────────────────────────────
            let eval = self.evaluate(valid_loader)?;
            self.history.push_val(eval.val_loss);
            tracing::debug!("Validated on {} examples", eval.examples);

            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4}",
                epoch, epochs, train_loss, eval.val_loss,
            );

            self.write_artifacts(epoch, train_loss, &eval, dims, sink);

            // ── Checkpoint (every interval, and always after the last epoch) ──
            if let Some(ckpt) = ckpt {
                if epoch % self.cfg.checkpoint_interval == 0 || epoch == epochs {
                    match ckpt.save_model(&self.model, epoch) {
                        Ok(()) => tracing::info!("Checkpoint saved for epoch {}", epoch),
                        Err(e) => tracing::error!("Checkpoint for epoch {} not saved: {:#}", epoch, e),
                    }
                }
            }
        }

        tracing::info!("Training complete after {} epochs", self.history.completed_epochs());
        Ok(())
    }

    fn write_artifacts(
        &mut self,
        epoch:      usize,
        train_loss: f64,
        eval:       &Evaluation,
        dims:       ImageDims,
        sink:       &dyn ArtifactSink,
    ) {
        if eval.compared > 0 {
            if let Err(e) = sink.save_reconstructions(
                epoch, &eval.originals, &eval.reconstructions, eval.compared, dims,
            ) {
                tracing::error!("Reconstructions for epoch {} not saved: {:#}", epoch, e);
            }
        }

        let count = self.cfg.sample_count;
        if count > 0 {
            let saved = self
                .sample_prior(count)
                .and_then(|samples| sink.save_samples(epoch, &samples, count, dims));
            if let Err(e) = saved {
                tracing::error!("Samples for epoch {} not saved: {:#}", epoch, e);
            }
        }

        if let Err(e) = sink.record_epoch(epoch, train_loss, eval.val_loss) {
            tracing::error!("Loss history for epoch {} not written: {:#}", epoch, e);
        }
    }
}

// ─── Entry point ──────────────────────────────────────────────────────────────
/// Build model, Adam and the two loaders, then run every epoch.
pub fn run_training<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: ImageDataset,
    val_dataset:   ImageDataset,
    ckpt:          Option<&CheckpointManager>,
    sink:          &dyn ArtifactSink,
    device:        B::Device,
) -> Result<(Vae<B>, LossHistory)> {
    // ── D must match every image before any loader is built ──────────────────
    train_dataset.check_width(cfg.dims())?;
    val_dataset.check_width(cfg.dims())?;

    B::seed(cfg.random_seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = cfg.model_config();
    let model: Vae<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: D={}, hidden={}, latent={}",
        model_cfg.input_dim, model_cfg.hidden_dim, model_cfg.latent_dim,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.random_seed)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader = DataLoaderBuilder::new(ImageBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .build(val_dataset);

    let mut session = TrainingSession::new(model, optim, cfg.clone(), device);
    session.run(train_loader.as_ref(), val_loader.as_ref(), ckpt, sink)?;
    Ok(session.into_parts())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::ImageItem;
    use crate::domain::traits::NullSink;
    use crate::ml::model::VaeConfig;
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::adaptor::OptimizerAdaptor;
    use burn::optim::Adam;
    use burn::tensor::TensorData;

    type TestBackend  = Autodiff<NdArray>;
    type InnerBackend = NdArray;
    type TestOptim    = OptimizerAdaptor<Adam, Vae<TestBackend>, TestBackend>;

    fn tiny_config(epochs: usize) -> TrainConfig {
        TrainConfig {
            epochs,
            batch_size:          4,
            latent_dim:          2,
            hidden_width:        8,
            channels:            1,
            height:              4,
            width:               4,
            checkpoint_interval: 1,
            learning_rate:       1e-2,
            sample_count:        4,
            comparison_count:    2,
            ..TrainConfig::default()
        }
    }

    fn items(n: usize) -> Vec<ImageItem> {
        (0..n)
            .map(|k| {
                let pixels = (0..16).map(|i| ((i + k) % 5) as f32 / 4.0).collect();
                ImageItem::new(format!("img_{k}.png"), 0, pixels)
            })
            .collect()
    }

    /// A fresh session and a snapshot of its initial weights.
    fn session(cfg: &TrainConfig) -> (TrainingSession<TestBackend, TestOptim>, Vec<f32>) {
        let device = Default::default();
        let model: Vae<TestBackend> = VaeConfig::new(16, cfg.hidden_width, cfg.latent_dim).init(&device);
        let initial = weights(&model);
        (TrainingSession::new(model, AdamConfig::new().init(), cfg.clone(), device), initial)
    }

    /// Every write fails.
    struct FailingSink;

    impl ArtifactSink for FailingSink {
        fn save_reconstructions(
            &self, _: usize, _: &[f32], _: &[f32], _: usize, _: ImageDims,
        ) -> Result<()> {
            anyhow::bail!("disk full")
        }

        fn save_samples(&self, _: usize, _: &[f32], _: usize, _: ImageDims) -> Result<()> {
            anyhow::bail!("disk full")
        }

        fn record_epoch(&self, _: usize, _: f64, _: f64) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn weights(model: &Vae<TestBackend>) -> Vec<f32> {
        let mut all = to_pixels(model.encoder.fc1.weight.val()).unwrap();
        all.extend(to_pixels(model.decoder.fc2.weight.val()).unwrap());
        all
    }

    fn batch_tensor(n: usize) -> Tensor<TestBackend, 2> {
        let flat: Vec<f32> = items(n).into_iter().flat_map(|i| i.pixels).collect();
        Tensor::from_data(TensorData::new(flat, [n, 16]), &Default::default())
    }

    #[test]
    fn test_single_step_is_finite_and_updates_parameters() {
        let cfg = tiny_config(1);
        let (mut s, before) = session(&cfg);

        let loss = s.train_step(batch_tensor(4)).unwrap();
        assert!(loss.is_finite());
        assert!(loss > 0.0);
        let (model, _) = s.into_parts();
        assert_ne!(before, weights(&model));
    }

    #[test]
    fn test_non_finite_loss_is_fatal_and_leaves_parameters() {
        let cfg = tiny_config(1);
        let (mut s, before) = session(&cfg);

        let mut flat: Vec<f32> = items(4).into_iter().flat_map(|i| i.pixels).collect();
        flat[5] = f32::NAN;
        let batch = Tensor::<TestBackend, 2>::from_data(TensorData::new(flat, [4, 16]), &Default::default());

        let err = s.train_step(batch).unwrap_err();
        assert!(err.to_string().contains("non-finite loss"));
        let (model, _) = s.into_parts();
        assert_eq!(before, weights(&model));
    }

    #[test]
    fn test_zero_epochs_is_a_no_op() {
        let cfg    = tiny_config(0);
        let device = <TestBackend as Backend>::Device::default();
        let (mut s, before) = session(&cfg);

        let train = DataLoaderBuilder::new(ImageBatcher::<TestBackend>::new(device.clone()))
            .batch_size(4)
            .build(ImageDataset::new(items(4)));
        let valid = DataLoaderBuilder::new(ImageBatcher::<InnerBackend>::new(device))
            .batch_size(4)
            .build(ImageDataset::new(items(4)));

        s.run(train.as_ref(), valid.as_ref(), None, &NullSink).unwrap();
        let (model, history) = s.into_parts();
        assert!(history.is_empty());
        assert_eq!(before, weights(&model));
    }

    #[test]
    fn test_epoch_average_uses_total_examples() {
        let cfg    = tiny_config(1);
        let device = <TestBackend as Backend>::Device::default();
        let model: Vae<InnerBackend> = VaeConfig::new(16, 8, 2).init(&device);

        // 5 items in batches of 4 → a short final batch of 1
        let loader = DataLoaderBuilder::new(ImageBatcher::<InnerBackend>::new(device))
            .batch_size(4)
            .build(ImageDataset::new(items(5)));

        let eval = evaluate(&model, loader.as_ref(), &mut NoiseSource::new(1), cfg.beta, 2).unwrap();
        assert_eq!(eval.examples, 5);
        assert_eq!(eval.compared, 2);
        assert_eq!(eval.originals.len(), 2 * 16);
        assert!(eval.val_loss.is_finite());
    }

    #[test]
    fn test_evaluation_is_idempotent_with_fixed_noise() {
        let device = <TestBackend as Backend>::Device::default();
        let model: Vae<InnerBackend> = VaeConfig::new(16, 8, 2).init(&device);
        let loader = DataLoaderBuilder::new(ImageBatcher::<InnerBackend>::new(device))
            .batch_size(3)
            .build(ImageDataset::new(items(7)));

        let a = evaluate(&model, loader.as_ref(), &mut NoiseSource::new(21), 1.0, 0).unwrap();
        let b = evaluate(&model, loader.as_ref(), &mut NoiseSource::new(21), 1.0, 0).unwrap();
        assert_eq!(a.val_loss, b.val_loss);
    }

    #[test]
    fn test_empty_validation_split_is_an_error() {
        let device = <TestBackend as Backend>::Device::default();
        let model: Vae<InnerBackend> = VaeConfig::new(16, 8, 2).init(&device);
        let loader = DataLoaderBuilder::new(ImageBatcher::<InnerBackend>::new(device))
            .batch_size(3)
            .build(ImageDataset::new(Vec::new()));

        assert!(evaluate(&model, loader.as_ref(), &mut NoiseSource::new(0), 1.0, 0).is_err());
    }

    #[test]
    fn test_prior_samples_are_in_unit_interval() {
        let device = <TestBackend as Backend>::Device::default();
        let model: Vae<InnerBackend> = VaeConfig::new(16, 8, 2).init(&device);

        let samples = sample_prior(&model, &mut NoiseSource::new(3), 64, &device);
        assert_eq!(samples.dims(), [64, 16]);
        let values = to_pixels(samples).unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_run_records_history_and_checkpoints() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let cfg  = TrainConfig { checkpoint_interval: 2, ..tiny_config(3) };

        let (_, history) = run_training::<TestBackend>(
            &cfg,
            ImageDataset::new(items(6)),
            ImageDataset::new(items(3)),
            Some(&ckpt),
            &NullSink,
            Default::default(),
        )
        .unwrap();

        assert_eq!(history.completed_epochs(), 3);
        assert!(history.train().iter().all(|l| l.is_finite()));
        // epoch 2 by interval, epoch 3 because it is the last one
        assert!(tmp.path().join("epoch_2.mpk").exists());
        assert!(!tmp.path().join("epoch_1.mpk").exists());
        assert_eq!(ckpt.latest_epoch().unwrap(), 3);
    }

    #[test]
    fn test_last_epoch_saved_below_interval() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        let cfg  = TrainConfig { checkpoint_interval: 5, ..tiny_config(2) };

        run_training::<TestBackend>(
            &cfg,
            ImageDataset::new(items(4)),
            ImageDataset::new(items(2)),
            Some(&ckpt),
            &NullSink,
            Default::default(),
        )
        .unwrap();

        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
    }

    #[test]
    fn test_failed_writes_do_not_stop_training() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path()).unwrap();
        // checkpoint writes fail too once the directory is gone
        std::fs::remove_dir_all(tmp.path()).unwrap();

        let (_, history) = run_training::<TestBackend>(
            &tiny_config(2),
            ImageDataset::new(items(4)),
            ImageDataset::new(items(2)),
            Some(&ckpt),
            &FailingSink,
            Default::default(),
        )
        .unwrap();

        assert_eq!(history.completed_epochs(), 2);
        assert_eq!(history.val().len(), 2);
    }

    #[test]
    fn test_width_mismatch_rejected_before_training() {
        let mut short = items(2);
        short[1] = ImageItem::new("short.png", 0, vec![0.5; 12]);

        let err = run_training::<TestBackend>(
            &tiny_config(1),
            ImageDataset::new(items(4)),
            ImageDataset::new(short),
            None,
            &NullSink,
            Default::default(),
        )
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::WidthMismatch { expected: 16, actual: 12, source_name: "short.png".into() })
        );
    }
}
