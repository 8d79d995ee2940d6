//! Configuration management
//!
//! A single TOML file describes one run: data source and class label,
//! training parameters, loss weights, model names, and (optionally) where
//! pretrained weights live. Malformed or missing fields are fatal at
//! startup.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tch::Device;

use crate::model::MAX_FEATURES;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Data source and run output settings
    pub data: DataConfig,
    /// Training parameters
    pub training: TrainingParameters,
    /// Loss weights and the discriminator learning rate
    pub weights: Weights,
    /// Display names
    pub names: Names,
    /// Pretrained model location, when one exists
    #[serde(default)]
    pub model_data: Option<ModelData>,
}

/// Data-related configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Path to the sequence CSV file
    pub data_path: String,
    /// Path to the pretrained classifier weights
    pub classifier_path: String,
    /// Class label the generator is trained to produce
    pub class_label: i64,
    /// Sensor sampling rate in Hz, used for plot time axes
    pub sampling_rate: f64,
    /// Directory for saved models, samples, and charts
    pub save_directory: String,
    /// Save the trained model on completion
    #[serde(default)]
    pub request_save: bool,
    /// Append per-epoch rows to the results log
    #[serde(default)]
    pub write_train_results: bool,
    /// Path of the results log
    #[serde(default = "default_results_path")]
    pub results_path: String,
}

/// Immutable training parameters
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingParameters {
    /// Sequences per training batch
    pub batch_size: i64,
    /// Synthetic sequences generated per evaluation pass
    pub test_size: i64,
    /// Size of the latent noise vector
    pub latent_dimension: i64,
    /// Generator learning rate
    #[serde(default = "default_generator_learning_rate")]
    pub generator_learning_rate: f64,
    /// Classifier accuracy at which training stops
    pub accuracy_threshold: f64,
    /// Epoch count at which training stops regardless of accuracy
    pub epoch_threshold: usize,
    /// Real windows sampled per synthetic window for RTS similarity
    pub real_synthetic_ratio: i64,
    /// Synthetic windows sampled per synthetic window for STS similarity
    pub synthetic_synthetic_ratio: i64,
    /// Statistics computed per channel by the feature extractor
    pub num_features: i64,
    /// Device: "cpu" or "cuda"
    #[serde(default = "default_device")]
    pub device: String,
}

/// Loss weights for the composite objective
#[derive(Debug, Clone, Deserialize)]
pub struct Weights {
    pub discriminator_loss_weight: f64,
    pub classifier_loss_weight: f64,
    pub sfd_loss_weight: f64,
    pub discriminator_learning_rate: f64,
}

/// Display names
#[derive(Debug, Clone, Deserialize)]
pub struct Names {
    pub classifier_name: String,
}

/// Location of pretrained generator/discriminator weights
#[derive(Debug, Clone, Deserialize)]
pub struct ModelData {
    pub generator_filename: String,
    pub discriminator_filename: String,
    pub directory: String,
    /// Whether the files are expected to exist
    #[serde(default)]
    pub exists: bool,
}

fn default_results_path() -> String {
    "results.csv".to_string()
}

fn default_generator_learning_rate() -> f64 {
    1e-3
}

fn default_device() -> String {
    "cpu".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing configuration file {}", path.display()))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.training.batch_size <= 0 {
            bail!("batch_size must be > 0");
        }
        if self.training.test_size <= 0 {
            bail!("test_size must be > 0");
        }
        if self.training.latent_dimension <= 0 {
            bail!("latent_dimension must be > 0");
        }
        if self.training.epoch_threshold == 0 {
            bail!("epoch_threshold must be > 0");
        }
        if !(0.0..=1.0).contains(&self.training.accuracy_threshold) {
            bail!("accuracy_threshold must be in [0, 1]");
        }
        if self.training.real_synthetic_ratio <= 0 || self.training.synthetic_synthetic_ratio <= 0 {
            bail!("similarity ratios must be > 0");
        }
        if !(1..=MAX_FEATURES).contains(&self.training.num_features) {
            bail!("num_features must be in 1..={}", MAX_FEATURES);
        }
        if self.training.generator_learning_rate <= 0.0 || self.weights.discriminator_learning_rate <= 0.0 {
            bail!("learning rates must be > 0");
        }
        if self.weights.discriminator_loss_weight < 0.0
            || self.weights.classifier_loss_weight < 0.0
            || self.weights.sfd_loss_weight < 0.0
        {
            bail!("loss weights must be non-negative");
        }
        if self.data.class_label < 0 {
            bail!("class_label must be non-negative");
        }
        if self.data.sampling_rate <= 0.0 {
            bail!("sampling_rate must be > 0");
        }
        Ok(())
    }
}

impl TrainingParameters {
    /// Resolve the configured device, falling back to CPU when CUDA is
    /// requested but unavailable.
    pub fn device(&self) -> Device {
        match self.device.to_lowercase().as_str() {
            "cuda" | "gpu" => {
                if tch::Cuda::is_available() {
                    Device::Cuda(0)
                } else {
                    tracing::warn!("CUDA requested but not available, falling back to CPU");
                    Device::Cpu
                }
            }
            _ => Device::Cpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[data]
data_path = "data/accelerometer.csv"
classifier_path = "models/classifier.pt"
class_label = 1
sampling_rate = 50.0
save_directory = "output"
write_train_results = true

[training]
batch_size = 16
test_size = 32
latent_dimension = 20
accuracy_threshold = 0.9
epoch_threshold = 100
real_synthetic_ratio = 5
synthetic_synthetic_ratio = 5
num_features = 5

[weights]
discriminator_loss_weight = 1.0
classifier_loss_weight = 1.0
sfd_loss_weight = 1.0
discriminator_learning_rate = 0.001

[names]
classifier_name = "activity-classifier"

[model_data]
generator_filename = "generator.pt"
discriminator_filename = "discriminator.pt"
directory = "models"
exists = true
"#;

    #[test]
    fn test_config_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = Config::from_toml(file.path()).unwrap();
        assert_eq!(config.data.class_label, 1);
        assert_eq!(config.training.batch_size, 16);
        assert_eq!(config.training.generator_learning_rate, 1e-3);
        assert!(config.model_data.as_ref().unwrap().exists);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_missing_section_fails() {
        let broken = SAMPLE.replace("[weights]", "[weights_typo]");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(broken.as_bytes()).unwrap();
        file.flush().unwrap();

        assert!(Config::from_toml(file.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();
        let mut config = Config::from_toml(file.path()).unwrap();

        config.training.batch_size = 0;
        assert!(config.validate().is_err());

        config.training.batch_size = 16;
        config.training.num_features = 99;
        assert!(config.validate().is_err());

        config.training.num_features = 5;
        config.weights.sfd_loss_weight = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_device_defaults_to_cpu() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file.flush().unwrap();
        let config = Config::from_toml(file.path()).unwrap();

        assert_eq!(config.training.device(), Device::Cpu);
    }
}
