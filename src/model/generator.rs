//! Generator network
//!
//! The Generator transforms random latent vectors into synthetic sensor
//! sequences. The latent vector is projected, repeated across the time
//! axis, passed through an LSTM, and mapped per timestep to the sensor
//! channels with a tanh output.

use tch::{nn, nn::Module, nn::RNN, Device, Kind, Tensor};

/// Generator network configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Size of the latent noise vector
    pub latent_dim: i64,
    /// Length of the output sequence
    pub seq_length: i64,
    /// Number of output channels (e.g. 3 for tri-axial accelerometer)
    pub num_channels: i64,
    /// LSTM hidden size
    pub hidden_size: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            latent_dim: 100,
            seq_length: 50,
            num_channels: 3,
            hidden_size: 128,
        }
    }
}

/// Generator network
///
/// Architecture:
/// 1. Dense projection of the latent vector
/// 2. Repeat across the time axis
/// 3. LSTM over the repeated sequence
/// 4. Per-timestep dense layer with tanh activation
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    fc: nn::Linear,
    lstm: nn::LSTM,
    out: nn::Linear,
}

impl Generator {
    /// Create a new Generator network
    pub fn new(vs: &nn::Path, config: GeneratorConfig) -> Self {
        let fc = nn::linear(vs / "fc", config.latent_dim, config.hidden_size, Default::default());
        let lstm = nn::lstm(
            vs / "lstm",
            config.hidden_size,
            config.hidden_size,
            nn::RNNConfig {
                batch_first: true,
                ..Default::default()
            },
        );
        let out = nn::linear(vs / "out", config.hidden_size, config.num_channels, Default::default());

        Self { config, fc, lstm, out }
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `noise` - Tensor of shape (batch_size, latent_dim)
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, seq_length, num_channels) in [-1, 1]
    pub fn forward(&self, noise: &Tensor) -> Tensor {
        let x = self.fc.forward(noise).relu();
        let x = x.unsqueeze(1).repeat([1, self.config.seq_length, 1]);
        let (x, _) = self.lstm.seq(&x);
        self.out.forward(&x).tanh()
    }

    /// Generate samples from fresh random noise
    pub fn generate_random(&self, num_samples: i64, device: Device) -> Tensor {
        let noise = Tensor::randn([num_samples, self.config.latent_dim], (Kind::Float, device));
        self.forward(&noise)
    }

    /// Get configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl Module for Generator {
    fn forward(&self, xs: &Tensor) -> Tensor {
        Generator::forward(self, xs)
    }
}
