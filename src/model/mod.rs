//! Model module containing the GAN architecture components
//!
//! This module provides:
//! - Generator network mapping latent vectors to synthetic sequences
//! - Discriminator network separating real from generated sequences
//! - Classifier network used as a frozen auxiliary training signal
//! - Fixed statistical feature extractor
//! - GanModel wrapper owning the networks and cached reference features

mod classifier;
mod discriminator;
mod feature_net;
mod gan;
mod generator;

pub use classifier::{Classifier, ClassifierConfig};
pub use discriminator::{Discriminator, DiscriminatorConfig};
pub use feature_net::{FeatureExtractor, MAX_FEATURES};
pub use gan::{GanModel, ReferenceFeatures};
pub use generator::{Generator, GeneratorConfig};
