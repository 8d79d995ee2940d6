//! # Sensor GAN
//!
//! A label-conditioned Generative Adversarial Network for synthesizing
//! multi-channel sensor time series (e.g. tri-axial accelerometer windows).
//! The generator is trained against a discriminator and additionally guided
//! by a frozen pretrained classifier and a statistical-feature
//! regularization term; synthetic data quality is scored with classifier
//! accuracy, similarity metrics, and statistical feature distance.
//!
//! ## Modules
//!
//! - `data`: labeled sequence dataset loading and sampling
//! - `model`: network topologies and the combined GAN model
//! - `training`: composite generator objective, alternating training loop
//! - `eval`: evaluation pipeline over a model snapshot
//! - `utils`: configuration, persistence, and plotting helpers

pub mod data;
pub mod eval;
pub mod model;
pub mod training;
pub mod utils;

pub use data::SequenceDataset;
pub use eval::{evaluate, generate_synthetic_data, EvaluationReport};
pub use model::{Classifier, Discriminator, FeatureExtractor, GanModel, Generator};
pub use training::{CompositeGraph, EpochRecord, GanTrainer, StopReason, TrainingHistory};
pub use utils::config::{Config, TrainingParameters, Weights};

#[cfg(test)]
pub(crate) mod test_support;
