//! Training module
//!
//! This module provides:
//! - Loss functions for the adversarial branches
//! - The composite generator objective with frozen auxiliaries
//! - The alternating training loop with its stopping criterion
//! - Per-epoch metric records

mod composite;
mod losses;
mod metrics;
mod trainer;

pub use composite::{
    one_hot_batch, CompositeGraph, CompositeOutput, GeneratorStepOutput, GeneratorTargets, LossBranch, LossWeights,
};
pub use losses::{binary_cross_entropy, categorical_cross_entropy, euclidean_distance, null_loss};
pub use metrics::{EpochRecord, TrainingHistory};
pub use trainer::{DiscriminatorStepOutput, GanTrainer, StopReason};
