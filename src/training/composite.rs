//! Composite generator objective
//!
//! Chains the generator's output through the frozen discriminator, the
//! frozen classifier, and the feature extractor, and combines the three
//! branch losses into one weighted objective. Only the generator's
//! parameter group is attached to the optimizer; the auxiliary networks
//! participate in the forward pass by shared reference and are never
//! stepped, so a generator update cannot touch their weights.

use anyhow::Result;
use tch::{Device, Kind, Tensor};

use crate::model::GanModel;

use super::losses;

/// Non-negative weights for the three loss branches.
#[derive(Debug, Clone, Copy)]
pub struct LossWeights {
    pub discriminator: f64,
    pub classifier: f64,
    pub sfd: f64,
}

/// Whether a loss branch contributes to the objective.
///
/// `Disabled` substitutes a constant-zero loss; the branch still appears in
/// the output record but contributes no gradient. This is a configuration
/// switch, not a structural change to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossBranch {
    Active,
    Disabled,
}

/// Targets for one generator update.
pub struct GeneratorTargets {
    /// All-ones labels: the generator wants the discriminator to say real
    pub real_labels: Tensor,
    /// One-hot batch of the target class
    pub class_targets: Tensor,
    /// Cached train-size reference feature vector
    pub reference_features: Tensor,
}

/// Output triple of the composite forward pass.
pub struct CompositeOutput {
    /// Discriminator verdict logits, shape (batch, 1)
    pub verdict: Tensor,
    /// Classifier prediction logits, shape (batch, num_classes)
    pub prediction: Tensor,
    /// Extracted feature vectors, shape (batch, num_channels * num_features)
    pub features: Tensor,
}

/// Result of one generator update, with every metric under its own name.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorStepOutput {
    pub total_loss: f64,
    pub discriminator_loss: f64,
    pub classifier_loss: f64,
    pub feature_loss: f64,
    /// Fraction of generated samples the discriminator called real
    pub discriminator_accuracy: f64,
    /// Fraction of generated samples the classifier assigned the target class
    pub classifier_accuracy: f64,
}

/// The optimizable generator objective.
pub struct CompositeGraph {
    optimizer: tch::nn::Optimizer,
    weights: LossWeights,
    classifier_branch: LossBranch,
    feature_branch: LossBranch,
    device: Device,
}

impl CompositeGraph {
    /// Assemble the objective over a model whose classifier is already
    /// frozen. The optimizer is built over the generator parameter group
    /// only, which is what keeps the auxiliary networks fixed during
    /// generator updates.
    pub fn new(
        model: &GanModel,
        weights: LossWeights,
        classifier_branch: LossBranch,
        feature_branch: LossBranch,
        learning_rate: f64,
    ) -> Result<Self> {
        let optimizer = model.generator_optimizer(learning_rate)?;
        Ok(Self {
            optimizer,
            weights,
            classifier_branch,
            feature_branch,
            device: model.device(),
        })
    }

    /// Forward pass: latent batch through the generator, then through each
    /// auxiliary head.
    pub fn forward(&self, model: &GanModel, noise: &Tensor) -> CompositeOutput {
        let synthetic = model.generator.forward(noise);
        CompositeOutput {
            verdict: model.discriminator.forward_t(&synthetic, true),
            prediction: model.classifier.forward_t(&synthetic, false),
            features: model.feature_net.forward(&synthetic),
        }
    }

    /// One gradient step on the generator against the target triple.
    pub fn step(&mut self, model: &GanModel, noise: &Tensor, targets: &GeneratorTargets) -> GeneratorStepOutput {
        let output = self.forward(model, noise);

        let discriminator_loss = losses::binary_cross_entropy(&output.verdict, &targets.real_labels);
        let classifier_loss = match self.classifier_branch {
            LossBranch::Active => losses::categorical_cross_entropy(&output.prediction, &targets.class_targets),
            LossBranch::Disabled => losses::null_loss(self.device),
        };
        let feature_loss = match self.feature_branch {
            LossBranch::Active => losses::euclidean_distance(&output.features, &targets.reference_features),
            LossBranch::Disabled => losses::null_loss(self.device),
        };

        let total = &discriminator_loss * self.weights.discriminator
            + &classifier_loss * self.weights.classifier
            + &feature_loss * self.weights.sfd;

        self.optimizer.zero_grad();
        total.backward();
        self.optimizer.step();

        let (discriminator_accuracy, classifier_accuracy) = tch::no_grad(|| {
            let fooled = output
                .verdict
                .sigmoid()
                .ge(0.5)
                .to_kind(Kind::Float)
                .mean(Kind::Float)
                .double_value(&[]);
            let predicted = output.prediction.argmax(-1, false);
            let expected = targets.class_targets.argmax(-1, false);
            let matched = predicted
                .eq_tensor(&expected)
                .to_kind(Kind::Float)
                .mean(Kind::Float)
                .double_value(&[]);
            (fooled, matched)
        });

        GeneratorStepOutput {
            total_loss: total.double_value(&[]),
            discriminator_loss: discriminator_loss.double_value(&[]),
            classifier_loss: classifier_loss.double_value(&[]),
            feature_loss: feature_loss.double_value(&[]),
            discriminator_accuracy,
            classifier_accuracy,
        }
    }

    /// Configured branch weights.
    pub fn weights(&self) -> LossWeights {
        self.weights
    }
}

/// One-hot batch of a single class label, shape (batch_size, num_classes).
pub fn one_hot_batch(class_label: i64, num_classes: i64, batch_size: i64, device: Device) -> Tensor {
    let targets = Tensor::zeros([batch_size, num_classes], (Kind::Float, device));
    let mut column = targets.narrow(1, class_label, 1);
    let _ = column.fill_(1.0);
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use tch::nn::VarStore;

    fn snapshot(vs: &VarStore) -> Vec<(String, Tensor)> {
        vs.variables()
            .iter()
            .map(|(name, value)| (name.clone(), value.copy()))
            .collect()
    }

    fn assert_unchanged(vs: &VarStore, before: &[(String, Tensor)]) {
        let now = vs.variables();
        for (name, old) in before {
            let current = now.get(name).expect("variable disappeared");
            assert!(current.equal(old), "variable {} changed", name);
        }
    }

    fn run_one_step(model: &GanModel, classifier_branch: LossBranch, feature_branch: LossBranch) -> GeneratorStepOutput {
        let weights = LossWeights {
            discriminator: 1.0,
            classifier: 1.0,
            sfd: 1.0,
        };
        let mut graph = CompositeGraph::new(model, weights, classifier_branch, feature_branch, 1e-3).unwrap();

        let batch = 4;
        let noise = Tensor::randn([batch, model.latent_dim()], (Kind::Float, model.device()));
        let targets = GeneratorTargets {
            real_labels: Tensor::ones([batch, 1], (Kind::Float, model.device())),
            class_targets: one_hot_batch(model.class_label(), model.num_classes(), batch, model.device()),
            reference_features: model.reference().train.narrow(0, 0, batch),
        };
        graph.step(model, &noise, &targets)
    }

    #[test]
    fn test_generator_step_leaves_auxiliaries_unchanged() {
        let (model, _config, _dir) = test_support::tiny_model();

        let disc_before = snapshot(model.discriminator_vars());
        let cls_before = snapshot(model.classifier_vars());
        let gen_before = snapshot(model.generator_vars());

        run_one_step(&model, LossBranch::Active, LossBranch::Active);

        assert_unchanged(model.discriminator_vars(), &disc_before);
        assert_unchanged(model.classifier_vars(), &cls_before);

        // and the generator itself must actually move
        let gen_after = model.generator_vars().variables();
        let moved = gen_before
            .iter()
            .any(|(name, old)| !gen_after.get(name).unwrap().equal(old));
        assert!(moved, "generator weights did not change");
    }

    #[test]
    fn test_disabled_classifier_branch_contributes_nothing() {
        let (model, _config, _dir) = test_support::tiny_model();

        let output = run_one_step(&model, LossBranch::Disabled, LossBranch::Active);
        assert_eq!(output.classifier_loss, 0.0);
        assert!(output.discriminator_loss > 0.0);
        assert!(output.feature_loss >= 0.0);
    }

    #[test]
    fn test_disabled_feature_branch_contributes_nothing() {
        let (model, _config, _dir) = test_support::tiny_model();

        let output = run_one_step(&model, LossBranch::Active, LossBranch::Disabled);
        assert_eq!(output.feature_loss, 0.0);
        assert!(output.discriminator_loss > 0.0);
    }

    #[test]
    fn test_step_output_metrics_in_range() {
        let (model, _config, _dir) = test_support::tiny_model();

        let output = run_one_step(&model, LossBranch::Active, LossBranch::Active);
        assert!((0.0..=1.0).contains(&output.discriminator_accuracy));
        assert!((0.0..=1.0).contains(&output.classifier_accuracy));
    }
}
