//! Alternating GAN training loop
//!
//! Each epoch runs, strictly in order: one discriminator update, one
//! generator update through the composite objective, then the evaluation
//! pipeline. The loop stops as soon as the classifier accuracy on
//! synthetic data reaches the configured threshold, or when the epoch
//! threshold is hit; both are normal completion.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tch::{Kind, Tensor};
use tracing::info;

use crate::eval;
use crate::model::GanModel;
use crate::utils::config::{Config, TrainingParameters};
use crate::utils::persist;

use super::composite::{one_hot_batch, CompositeGraph, GeneratorStepOutput, GeneratorTargets, LossBranch, LossWeights};
use super::losses;
use super::metrics::{EpochRecord, TrainingHistory};

/// Why the training loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Classifier accuracy reached the configured threshold
    Converged,
    /// Epoch threshold reached before convergence
    EpochLimitReached,
}

/// Result of one discriminator update.
#[derive(Debug, Clone, Copy)]
pub struct DiscriminatorStepOutput {
    pub loss: f64,
    pub accuracy: f64,
}

/// GAN trainer owning the optimizer state.
pub struct GanTrainer {
    composite: CompositeGraph,
    disc_optimizer: tch::nn::Optimizer,
    params: TrainingParameters,
    history: TrainingHistory,
    write_train_results: bool,
    results_path: String,
}

impl GanTrainer {
    /// Create a trainer for the given model.
    ///
    /// `ignore_classifier` and `ignore_regularization` disable the matching
    /// loss branch of the composite objective.
    pub fn new(model: &GanModel, config: &Config, ignore_classifier: bool, ignore_regularization: bool) -> Result<Self> {
        let weights = LossWeights {
            discriminator: config.weights.discriminator_loss_weight,
            classifier: config.weights.classifier_loss_weight,
            sfd: config.weights.sfd_loss_weight,
        };
        let classifier_branch = if ignore_classifier { LossBranch::Disabled } else { LossBranch::Active };
        let feature_branch = if ignore_regularization { LossBranch::Disabled } else { LossBranch::Active };

        let composite = CompositeGraph::new(
            model,
            weights,
            classifier_branch,
            feature_branch,
            config.training.generator_learning_rate,
        )?;
        let disc_optimizer = model.discriminator_optimizer(config.weights.discriminator_learning_rate)?;

        Ok(Self {
            composite,
            disc_optimizer,
            params: config.training.clone(),
            history: TrainingHistory::new(),
            write_train_results: config.data.write_train_results,
            results_path: config.data.results_path.clone(),
        })
    }

    /// One discriminator update.
    ///
    /// Real sequences are drawn with replacement and labeled real;
    /// generated sequences are detached from the generator graph and
    /// labeled fake. A single optimizer step runs on the combined batch,
    /// touching only discriminator weights.
    pub fn discriminator_step(&mut self, model: &GanModel) -> DiscriminatorStepOutput {
        let batch_size = self.params.batch_size;
        let device = model.device();

        let real = model.sample_real_batch(batch_size);
        let noise = Tensor::randn([batch_size, self.params.latent_dimension], (Kind::Float, device));
        let fake = model.generator.forward(&noise).detach();

        let inputs = Tensor::cat(&[real, fake], 0);
        let targets = Tensor::cat(
            &[
                Tensor::ones([batch_size, 1], (Kind::Float, device)),
                Tensor::zeros([batch_size, 1], (Kind::Float, device)),
            ],
            0,
        );

        let logits = model.discriminator.forward_t(&inputs, true);
        let loss = losses::binary_cross_entropy(&logits, &targets);

        self.disc_optimizer.zero_grad();
        loss.backward();
        self.disc_optimizer.step();

        let accuracy = tch::no_grad(|| {
            logits
                .sigmoid()
                .ge(0.5)
                .to_kind(Kind::Float)
                .eq_tensor(&targets)
                .to_kind(Kind::Float)
                .mean(Kind::Float)
                .double_value(&[])
        });

        DiscriminatorStepOutput {
            loss: loss.double_value(&[]),
            accuracy,
        }
    }

    /// One generator update through the composite objective.
    pub fn generator_step(&mut self, model: &GanModel) -> GeneratorStepOutput {
        let batch_size = self.params.batch_size;
        let device = model.device();

        let noise = Tensor::randn([batch_size, self.params.latent_dimension], (Kind::Float, device));
        let targets = GeneratorTargets {
            real_labels: Tensor::ones([batch_size, 1], (Kind::Float, device)),
            class_targets: one_hot_batch(model.class_label(), model.num_classes(), batch_size, device),
            reference_features: model.reference().train.shallow_clone(),
        };

        self.composite.step(model, &noise, &targets)
    }

    /// Run the training loop to completion.
    pub fn train(&mut self, model: &GanModel) -> Result<StopReason> {
        let accuracy_threshold = self.params.accuracy_threshold;
        let epoch_threshold = self.params.epoch_threshold;

        let mut generator_classifier_accuracy = 0.0;
        let mut epoch: usize = 1;

        info!(
            "Starting training for class {} (accuracy threshold {:.2}, epoch threshold {})",
            model.class_label(),
            accuracy_threshold,
            epoch_threshold
        );

        let pb = ProgressBar::new(epoch_threshold as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("##-"),
        );

        let outcome = loop {
            if generator_classifier_accuracy >= accuracy_threshold {
                break StopReason::Converged;
            }
            if epoch >= epoch_threshold {
                break StopReason::EpochLimitReached;
            }

            // discriminator, then generator, then evaluation; the order is
            // load-bearing and must not change
            let disc = self.discriminator_step(model);
            let gen = self.generator_step(model);
            let report = eval::evaluate(model, &self.params);
            generator_classifier_accuracy = report.classifier_accuracy;

            info!("------------------------------ Epoch {} ------------------------------", epoch);
            info!("Discriminator accuracy (D ACC): {:.4}", disc.accuracy);
            info!("Generator accuracy in tricking the discriminator: {:.4}", gen.discriminator_accuracy);
            info!("Classifier accuracy for synthetic data: {:.4}", report.classifier_accuracy);
            info!("RTS similarity: {:.4}", report.mean_rts_similarity);
            info!("STS similarity: {:.4}", report.mean_sts_similarity);
            info!("Statistical Feature Distance (SFD): {:.4}", report.statistical_feature_distance);

            let record = EpochRecord {
                epoch,
                discriminator_accuracy: disc.accuracy,
                generator_discriminator_accuracy: gen.discriminator_accuracy,
                generator_classifier_accuracy,
                mean_rts_similarity: report.mean_rts_similarity,
                mean_sts_similarity: report.mean_sts_similarity,
            };

            if self.write_train_results {
                persist::append_results(&self.results_path, model.class_label(), &record)?;
            }

            self.history.push(record);
            epoch += 1;

            pb.set_message(format!("C_acc {:.3}", generator_classifier_accuracy));
            pb.inc(1);
        };

        pb.finish_with_message("done");

        match outcome {
            StopReason::Converged => info!(
                "Converged at epoch {} with classifier accuracy {:.4}",
                epoch, generator_classifier_accuracy
            ),
            StopReason::EpochLimitReached => info!(
                "Epoch threshold {} reached with classifier accuracy {:.4}",
                epoch_threshold, generator_classifier_accuracy
            ),
        }

        Ok(outcome)
    }

    /// Recorded per-epoch metrics.
    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }
}
