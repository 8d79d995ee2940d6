//! Discriminator network
//!
//! The Discriminator classifies sensor sequences as real or generated.
//! An LSTM reads the sequence; the final hidden output is mapped to a
//! single real/fake logit.

use tch::{nn, nn::Module, nn::ModuleT, nn::RNN, Tensor};

/// Discriminator network configuration
#[derive(Debug, Clone)]
pub struct DiscriminatorConfig {
    /// Number of input channels per timestep
    pub num_channels: i64,
    /// LSTM hidden size
    pub hidden_size: i64,
    /// Dropout rate applied before the output layer
    pub dropout: f64,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        Self {
            num_channels: 3,
            hidden_size: 100,
            dropout: 0.3,
        }
    }
}

/// Discriminator network
#[derive(Debug)]
pub struct Discriminator {
    config: DiscriminatorConfig,
    lstm: nn::LSTM,
    fc: nn::Linear,
}

impl Discriminator {
    /// Create a new Discriminator network
    pub fn new(vs: &nn::Path, config: DiscriminatorConfig) -> Self {
        let lstm = nn::lstm(
            vs / "lstm",
            config.num_channels,
            config.hidden_size,
            nn::RNNConfig {
                batch_first: true,
                ..Default::default()
            },
        );
        let fc = nn::linear(vs / "fc", config.hidden_size, 1, Default::default());

        Self { config, lstm, fc }
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape (batch_size, seq_length, num_channels)
    /// * `train` - Whether in training mode (affects dropout)
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, 1) with logits (not sigmoid)
    pub fn forward_t(&self, input: &Tensor, train: bool) -> Tensor {
        let (out, _) = self.lstm.seq(input);
        let seq_length = out.size()[1];
        let last = out.select(1, seq_length - 1);
        let last = last.dropout(self.config.dropout, train);
        self.fc.forward(&last)
    }

    /// Classify samples (inference mode)
    ///
    /// Returns probability of being real (after sigmoid)
    pub fn classify(&self, input: &Tensor) -> Tensor {
        self.forward_t(input, false).sigmoid()
    }

    /// Get configuration
    pub fn config(&self) -> &DiscriminatorConfig {
        &self.config
    }
}

impl ModuleT for Discriminator {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        Discriminator::forward_t(self, xs, train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_discriminator_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());

        let input = Tensor::randn([4, 50, 3], (Kind::Float, Device::Cpu));
        let output = disc.forward_t(&input, false);

        assert_eq!(output.size(), vec![4, 1]);
    }

    #[test]
    fn test_discriminator_classify() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());

        let input = Tensor::randn([2, 50, 3], (Kind::Float, Device::Cpu));
        let probs = disc.classify(&input);

        let min_val: f64 = probs.min().double_value(&[]);
        let max_val: f64 = probs.max().double_value(&[]);
        assert!(min_val >= 0.0 && max_val <= 1.0);
    }
}
