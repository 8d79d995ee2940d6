//! Classifier network
//!
//! Multi-class sequence classifier. The pretrained instance is loaded at
//! model construction and used frozen, only as an auxiliary signal guiding
//! the generator toward class-consistent output. A fresh instance of the
//! same topology serves as the train-synthetic-test-real classifier.

use tch::{nn, nn::Module, nn::ModuleT, nn::RNN, Tensor};

/// Classifier network configuration
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Number of input channels per timestep
    pub num_channels: i64,
    /// Number of output classes
    pub num_classes: i64,
    /// LSTM hidden size
    pub hidden_size: i64,
    /// Dropout rate applied before the output layer
    pub dropout: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            num_channels: 3,
            num_classes: 2,
            hidden_size: 100,
            dropout: 0.3,
        }
    }
}

/// LSTM sequence classifier
#[derive(Debug)]
pub struct Classifier {
    config: ClassifierConfig,
    lstm: nn::LSTM,
    fc: nn::Linear,
}

impl Classifier {
    /// Create a new Classifier network
    pub fn new(vs: &nn::Path, config: ClassifierConfig) -> Self {
        let lstm = nn::lstm(
            vs / "lstm",
            config.num_channels,
            config.hidden_size,
            nn::RNNConfig {
                batch_first: true,
                ..Default::default()
            },
        );
        let fc = nn::linear(vs / "fc", config.hidden_size, config.num_classes, Default::default());

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
    /// Tensor of shape (batch_size, num_classes) with logits
    pub fn forward_t(&self, input: &Tensor, train: bool) -> Tensor {
        let (out, _) = self.lstm.seq(input);
        let seq_length = out.size()[1];
        let last = out.select(1, seq_length - 1);
        let last = last.dropout(self.config.dropout, train);
        self.fc.forward(&last)
    }

    /// Predicted class indices (inference mode)
    pub fn predict(&self, input: &Tensor) -> Tensor {
        self.forward_t(input, false).argmax(-1, false)
    }

    /// Get configuration
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

impl ModuleT for Classifier {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        Classifier::forward_t(self, xs, train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_classifier_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let config = ClassifierConfig {
            num_classes: 4,
            ..Default::default()
        };
        let classifier = Classifier::new(&vs.root(), config);

        let input = Tensor::randn([3, 50, 3], (Kind::Float, Device::Cpu));
        let logits = classifier.forward_t(&input, false);

        assert_eq!(logits.size(), vec![3, 4]);
    }

    #[test]
    fn test_classifier_predict_range() {
        let vs = VarStore::new(Device::Cpu);
        let classifier = Classifier::new(&vs.root(), ClassifierConfig::default());

        let input = Tensor::randn([5, 50, 3], (Kind::Float, Device::Cpu));
        let preds = classifier.predict(&input);

        assert_eq!(preds.size(), vec![5]);
        let max_class: i64 = preds.max().int64_value(&[]);
        assert!(max_class < 2);
    }
}
