//! GAN model wrapper
//!
//! Owns the generator, discriminator, pretrained classifier, and the
//! statistical feature extractor, one parameter store per network, plus the
//! cached reference feature vectors computed once from the real data.
//! Construction order matters: data is loaded and validated first, the
//! classifier is loaded and frozen before any training step can run, and
//! the reference vectors are computed last, never to be refreshed.

use anyhow::{bail, Context, Result};
use tch::{nn, nn::OptimizerConfig, nn::VarStore, Device, Kind, Tensor};
use tracing::info;

use crate::data::{self, SequenceDataset};
use crate::utils::config::Config;

use super::classifier::{Classifier, ClassifierConfig};
use super::discriminator::{Discriminator, DiscriminatorConfig};
use super::feature_net::FeatureExtractor;
use super::generator::{Generator, GeneratorConfig};

/// Mean feature vectors of the real data, repeated to batch and test size.
///
/// Computed exactly once at construction; the dataset is immutable for the
/// life of the run, so these never go stale.
#[derive(Debug)]
pub struct ReferenceFeatures {
    /// Reference repeated to `batch_size` rows, used in the training loss
    pub train: Tensor,
    /// Reference repeated to `test_size` rows, used in evaluation
    pub test: Tensor,
}

/// Complete GAN model with its auxiliary networks.
pub struct GanModel {
    /// Generator network
    pub generator: Generator,
    /// Discriminator network
    pub discriminator: Discriminator,
    /// Pretrained classifier, frozen at load time
    pub classifier: Classifier,
    /// Fixed statistical feature extractor
    pub feature_net: FeatureExtractor,
    gen_vs: VarStore,
    disc_vs: VarStore,
    cls_vs: VarStore,
    device: Device,
    real_data: Tensor,
    reference: ReferenceFeatures,
    classifier_name: String,
    class_label: i64,
    num_classes: i64,
    num_seqs: i64,
    seq_length: i64,
    num_channels: i64,
}

impl GanModel {
    /// Build the model from the data file named in the configuration.
    pub fn new(config: &Config, load_pretrained: bool) -> Result<Self> {
        let dataset = SequenceDataset::from_csv(&config.data.data_path)?;
        Self::from_dataset(&dataset, config, load_pretrained)
    }

    /// Build the model from an already loaded dataset.
    ///
    /// With `load_pretrained` set, generator and discriminator weights are
    /// loaded from the `[model_data]` section; a missing section or file is
    /// fatal, there is no fallback to fresh initialization.
    pub fn from_dataset(dataset: &SequenceDataset, config: &Config, load_pretrained: bool) -> Result<Self> {
        let device = config.training.device();
        let class_label = config.data.class_label;
        let seq_length = dataset.seq_length() as i64;
        let num_channels = dataset.num_channels() as i64;
        let num_classes = dataset.num_classes();

        let class_data = dataset.class_subset(class_label)?;
        let num_seqs = class_data.shape()[0] as i64;
        let real_data = data::to_tensor(class_data, device)?;
        info!(
            "Loaded {} sequences of shape ({}, {}) for class {}",
            num_seqs, seq_length, num_channels, class_label
        );

        let mut cls_vs = VarStore::new(device);
        let classifier = Classifier::new(
            &cls_vs.root(),
            ClassifierConfig {
                num_channels,
                num_classes,
                ..Default::default()
            },
        );
        cls_vs
            .load(&config.data.classifier_path)
            .with_context(|| format!("loading pretrained classifier from {}", config.data.classifier_path))?;
        // Frozen here, once, before any training step; never toggled again.
        cls_vs.freeze();
        info!("Loaded classifier '{}'", config.names.classifier_name);

        let mut gen_vs = VarStore::new(device);
        let generator = Generator::new(
            &gen_vs.root(),
            GeneratorConfig {
                latent_dim: config.training.latent_dimension,
                seq_length,
                num_channels,
                ..Default::default()
            },
        );

        let mut disc_vs = VarStore::new(device);
        let discriminator = Discriminator::new(
            &disc_vs.root(),
            DiscriminatorConfig {
                num_channels,
                ..Default::default()
            },
        );

        if load_pretrained {
            let model_data = match &config.model_data {
                Some(md) if md.exists => md,
                _ => bail!("pretrained model requested but [model_data] is missing or marked absent"),
            };
            let gen_path = std::path::Path::new(&model_data.directory).join(&model_data.generator_filename);
            let disc_path = std::path::Path::new(&model_data.directory).join(&model_data.discriminator_filename);
            gen_vs
                .load(&gen_path)
                .with_context(|| format!("loading pretrained generator from {}", gen_path.display()))?;
            disc_vs
                .load(&disc_path)
                .with_context(|| format!("loading pretrained discriminator from {}", disc_path.display()))?;
            info!("Loaded pretrained generator and discriminator from {}", model_data.directory);
        }

        let feature_net = FeatureExtractor::new(config.training.num_features);
        let reference = compute_reference_features(
            &feature_net,
            &real_data,
            config.training.batch_size,
            config.training.test_size,
        );

        Ok(Self {
            generator,
            discriminator,
            classifier,
            feature_net,
            gen_vs,
            disc_vs,
            cls_vs,
            device,
            real_data,
            reference,
            classifier_name: config.names.classifier_name.clone(),
            class_label,
            num_classes,
            num_seqs,
            seq_length,
            num_channels,
        })
    }

    /// Generate synthetic sequences from fresh latent vectors.
    ///
    /// # Returns
    ///
    /// Tensor of shape (num_samples, seq_length, num_channels)
    pub fn generate(&self, num_samples: i64) -> Tensor {
        tch::no_grad(|| self.generator.generate_random(num_samples, self.device))
    }

    /// Draw a real batch with replacement from the class subset.
    pub fn sample_real_batch(&self, batch_size: i64) -> Tensor {
        data::sample_rows_with_replacement(&self.real_data, batch_size)
    }

    /// One random real window of shape (seq_length, num_channels).
    pub fn random_real_segment(&self) -> Tensor {
        use rand::Rng;
        let index = rand::thread_rng().gen_range(0..self.num_seqs);
        self.real_data.get(index)
    }

    /// Generator optimizer (Adam with GAN betas) over generator weights only.
    pub fn generator_optimizer(&self, learning_rate: f64) -> Result<nn::Optimizer> {
        nn::Adam {
            beta1: 0.5,
            beta2: 0.999,
            wd: 0.0,
            ..Default::default()
        }
        .build(&self.gen_vs, learning_rate)
        .context("building generator optimizer")
    }

    /// Discriminator optimizer over discriminator weights only.
    pub fn discriminator_optimizer(&self, learning_rate: f64) -> Result<nn::Optimizer> {
        nn::Adam {
            beta1: 0.5,
            beta2: 0.999,
            wd: 0.0,
            ..Default::default()
        }
        .build(&self.disc_vs, learning_rate)
        .context("building discriminator optimizer")
    }

    /// Persist generator and discriminator weights.
    pub fn save_networks(&self, directory: &str, generator_filename: &str, discriminator_filename: &str) -> Result<()> {
        crate::utils::persist::save_network(&self.gen_vs, directory, generator_filename)?;
        crate::utils::persist::save_network(&self.disc_vs, directory, discriminator_filename)?;
        Ok(())
    }

    /// Parameter store of the generator.
    pub fn generator_vars(&self) -> &VarStore {
        &self.gen_vs
    }

    /// Parameter store of the discriminator.
    pub fn discriminator_vars(&self) -> &VarStore {
        &self.disc_vs
    }

    /// Parameter store of the frozen classifier.
    pub fn classifier_vars(&self) -> &VarStore {
        &self.cls_vs
    }

    /// Cached reference feature vectors.
    pub fn reference(&self) -> &ReferenceFeatures {
        &self.reference
    }

    /// Real sequences of the target class, on the model device.
    pub fn real_data(&self) -> &Tensor {
        &self.real_data
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn class_label(&self) -> i64 {
        self.class_label
    }

    pub fn num_classes(&self) -> i64 {
        self.num_classes
    }

    pub fn num_real_sequences(&self) -> i64 {
        self.num_seqs
    }

    pub fn seq_length(&self) -> i64 {
        self.seq_length
    }

    pub fn num_channels(&self) -> i64 {
        self.num_channels
    }

    pub fn latent_dim(&self) -> i64 {
        self.generator.config().latent_dim
    }

    pub fn classifier_name(&self) -> &str {
        &self.classifier_name
    }
}

/// Mean feature vector over the real data, repeated to batch and test size.
fn compute_reference_features(
    feature_net: &FeatureExtractor,
    real_data: &Tensor,
    batch_size: i64,
    test_size: i64,
) -> ReferenceFeatures {
    tch::no_grad(|| {
        let features = feature_net.forward(real_data);
        let mean = features.mean_dim(0, true, Kind::Float);
        ReferenceFeatures {
            train: mean.repeat([batch_size, 1]),
            test: mean.repeat([test_size, 1]),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn test_model_construction() {
        let (model, config, _dir) = test_support::tiny_model();

        assert_eq!(model.seq_length(), 16);
        assert_eq!(model.num_channels(), 3);
        assert_eq!(model.num_classes(), 2);
        assert_eq!(model.latent_dim(), config.training.latent_dimension);
        assert_eq!(model.real_data().size()[0], model.num_real_sequences());
    }

    #[test]
    fn test_reference_feature_shapes() {
        let (model, config, _dir) = test_support::tiny_model();

        let feature_len = model.num_channels() * config.training.num_features;
        assert_eq!(
            model.reference().train.size(),
            vec![config.training.batch_size, feature_len]
        );
        assert_eq!(
            model.reference().test.size(),
            vec![config.training.test_size, feature_len]
        );
    }

    #[test]
    fn test_generate_shape() {
        let (model, _config, _dir) = test_support::tiny_model();

        let samples = model.generate(7);
        assert_eq!(samples.size(), vec![7, 16, 3]);
    }

    #[test]
    fn test_missing_classifier_is_fatal() {
        let (_, mut config, _dir) = test_support::tiny_fixture();
        config.data.classifier_path = "/nonexistent/classifier.pt".to_string();

        let dataset = test_support::tiny_dataset();
        assert!(GanModel::from_dataset(&dataset, &config, false).is_err());
    }

    #[test]
    fn test_pretrained_without_model_data_is_fatal() {
        let (dataset, config, _dir) = test_support::tiny_fixture();
        assert!(GanModel::from_dataset(&dataset, &config, true).is_err());
    }
}
