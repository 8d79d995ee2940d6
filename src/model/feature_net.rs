//! Statistical feature extractor
//!
//! Maps a batch of sensor windows to per-channel summary statistics. The
//! mapping has no trainable parameters; it is a fixed, differentiable
//! computation, so it can regularize generator training without ever being
//! updated itself.

use tch::{Kind, Tensor};

/// Number of statistics available per channel.
pub const MAX_FEATURES: i64 = 8;

const EPS: f64 = 1e-8;

/// Fixed statistical feature network.
///
/// For each channel the first `num_features` of
/// [mean, std, min, max, range, rms, skewness, kurtosis] are computed over
/// the time axis and flattened channel-major into a single feature vector
/// of length `num_channels * num_features`.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    num_features: i64,
}

impl FeatureExtractor {
    pub fn new(num_features: i64) -> Self {
        Self {
            num_features: num_features.clamp(1, MAX_FEATURES),
        }
    }

    /// Number of statistics computed per channel.
    pub fn num_features(&self) -> i64 {
        self.num_features
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape (batch_size, seq_length, num_channels)
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, num_channels * num_features)
    pub fn forward(&self, input: &Tensor) -> Tensor {
        let x = input.transpose(1, 2);
        let batch_size = input.size()[0];

        let mean = x.mean_dim(-1, true, Kind::Float);
        let centered = &x - &mean;
        let var = centered.square().mean_dim(-1, true, Kind::Float);
        let std = (&var + EPS).sqrt();
        let (min, _) = x.min_dim(-1, true);
        let (max, _) = x.max_dim(-1, true);
        let range = &max - &min;
        let rms = x.square().mean_dim(-1, true, Kind::Float).sqrt();
        let third = (&centered * &centered * &centered).mean_dim(-1, true, Kind::Float);
        let skewness = &third / (&std * &std * &std + EPS);
        let fourth = (&centered * &centered * &centered * &centered).mean_dim(-1, true, Kind::Float);
        let kurtosis = &fourth / (&var * &var + EPS);

        let stats = [mean, std, min, max, range, rms, skewness, kurtosis];
        let selected = Tensor::cat(&stats[..self.num_features as usize], 2);
        selected.reshape([batch_size, -1])
    }
}
