use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::ml::sampling::reparameterize;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct VaeConfig {
    /// Flattened image width D = C * H * W
    pub input_dim:  usize,
    /// Hidden width H1 shared by encoder and decoder
    pub hidden_dim: usize,
    /// Latent dimensionality Z
    pub latent_dim: usize,
}

impl VaeConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Vae<B> {
        let encoder = Encoder {
            fc1:       LinearConfig::new(self.input_dim, self.hidden_dim).init(device),
            fc_mu:     LinearConfig::new(self.hidden_dim, self.latent_dim).init(device),
            fc_logvar: LinearConfig::new(self.hidden_dim, self.latent_dim).init(device),
            activation: Relu::new(),
        };
        let decoder = Decoder {
            fc1:        LinearConfig::new(self.latent_dim, self.hidden_dim).init(device),
            fc2:        LinearConfig::new(self.hidden_dim, self.input_dim).init(device),
            activation: Relu::new(),
        };
        Vae {
            encoder,
            decoder,
            input_dim:  self.input_dim,
            latent_dim: self.latent_dim,
        }
    }
}

/// x: [N, D] → (mu, logvar): [N, Z] each. Neither head has an activation.
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub fc1:       Linear<B>,
    pub fc_mu:     Linear<B>,
    pub fc_logvar: Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> Encoder<B> {
    pub fn forward(&self, x: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let h = self.activation.forward(self.fc1.forward(x));
        let mu     = self.fc_mu.forward(h.clone());
        let logvar = self.fc_logvar.forward(h);
        (mu, logvar)
    }
}

/// z: [N, Z] → reconstruction: [N, D], squashed into (0,1) by a sigmoid.
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub fc1:        Linear<B>,
    pub fc2:        Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> Decoder<B> {
    pub fn forward(&self, z: Tensor<B, 2>) -> Tensor<B, 2> {
        let h = self.activation.forward(self.fc1.forward(z));
        sigmoid(self.fc2.forward(h))
    }
}

#[derive(Module, Debug)]
pub struct Vae<B: Backend> {
    pub encoder:    Encoder<B>,
    pub decoder:    Decoder<B>,
    pub input_dim:  usize,
    pub latent_dim: usize,
}

/// Everything one forward pass produces.
pub struct VaeOutput<B: Backend> {
    pub reconstruction: Tensor<B, 2>,
    pub mu:             Tensor<B, 2>,
    pub logvar:         Tensor<B, 2>,
}

impl<B: Backend> Vae<B> {
    /// Encoder → reparameterize with the given noise → decoder.
    ///
    /// `eps` must be [N, Z] standard-normal noise drawn by the caller.
    pub fn forward(&self, x: Tensor<B, 2>, eps: Tensor<B, 2>) -> VaeOutput<B> {
        let (mu, logvar) = self.encoder.forward(x);
        let z = reparameterize(mu.clone(), logvar.clone(), eps);
        let reconstruction = self.decoder.forward(z);
        VaeOutput { reconstruction, mu, logvar }
    }

    pub fn decode(&self, z: Tensor<B, 2>) -> Tensor<B, 2> {
        self.decoder.forward(z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::sampling::NoiseSource;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    fn input(n: usize, d: usize) -> Tensor<TestBackend, 2> {
        let data: Vec<f32> = (0..n * d).map(|i| (i % 7) as f32 / 7.0).collect();
        Tensor::from_data(TensorData::new(data, [n, d]), &Default::default())
    }

    #[test]
    fn test_output_shapes() {
        let device = Default::default();
        let model: Vae<TestBackend> = VaeConfig::new(16, 8, 2).init(&device);
        let mut noise = NoiseSource::new(1);

        let out = model.forward(input(4, 16), noise.standard_normal(4, 2, &device));
        assert_eq!(out.reconstruction.dims(), [4, 16]);
        assert_eq!(out.mu.dims(), [4, 2]);
        assert_eq!(out.logvar.dims(), [4, 2]);
    }

    #[test]
    fn test_reconstruction_in_unit_interval() {
        let device = Default::default();
        let model: Vae<TestBackend> = VaeConfig::new(16, 8, 2).init(&device);
        let mut noise = NoiseSource::new(3);

        let out = model.forward(input(4, 16), noise.standard_normal(4, 2, &device));
        let values: Vec<f32> = out.reconstruction.into_data().to_vec().unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_same_noise_same_reconstruction() {
        let device = Default::default();
        let model: Vae<TestBackend> = VaeConfig::new(16, 8, 2).init(&device);

        let a = model.forward(input(4, 16), NoiseSource::new(9).standard_normal(4, 2, &device));
        let b = model.forward(input(4, 16), NoiseSource::new(9).standard_normal(4, 2, &device));
        let a: Vec<f32> = a.reconstruction.into_data().to_vec().unwrap();
        let b: Vec<f32> = b.reconstruction.into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_noise_changes_only_the_sample() {
        let device = Default::default();
        let model: Vae<TestBackend> = VaeConfig::new(16, 8, 2).init(&device);

        let a = model.forward(input(4, 16), NoiseSource::new(1).standard_normal(4, 2, &device));
        let b = model.forward(input(4, 16), NoiseSource::new(2).standard_normal(4, 2, &device));

        let mu_a: Vec<f32> = a.mu.into_data().to_vec().unwrap();
        let mu_b: Vec<f32> = b.mu.into_data().to_vec().unwrap();
        assert_eq!(mu_a, mu_b);
        let lv_a: Vec<f32> = a.logvar.into_data().to_vec().unwrap();
        let lv_b: Vec<f32> = b.logvar.into_data().to_vec().unwrap();
        assert_eq!(lv_a, lv_b);

        let r_a: Vec<f32> = a.reconstruction.into_data().to_vec().unwrap();
        let r_b: Vec<f32> = b.reconstruction.into_data().to_vec().unwrap();
        assert_ne!(r_a, r_b);
    }
}
