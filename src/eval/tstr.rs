//! Train-synthetic-test-real classifier
//!
//! Trains a fresh classifier, with the same topology as the pretrained
//! one, on a synthetic batch labeled with the fixed class label, then
//! scores it on the real data. Decoupled from the training loop and
//! invoked ad hoc.

use anyhow::{Context, Result};
use tch::{nn, nn::OptimizerConfig, nn::VarStore, Kind, Tensor};
use tracing::info;

use crate::model::{Classifier, ClassifierConfig, GanModel};

const TSTR_STEPS: usize = 50;
const TSTR_LEARNING_RATE: f64 = 1e-3;

/// Outcome of a TSTR training run.
#[derive(Debug, Clone, Copy)]
pub struct TstrReport {
    /// Cross-entropy loss after the final step
    pub final_loss: f64,
    /// Accuracy of the freshly trained classifier on the real data
    pub real_data_accuracy: f64,
}

/// Train a fresh classifier on `synthetic` data labeled with the model's
/// class label, then test it on the real data.
pub fn train_tstr_classifier(model: &GanModel, synthetic: &Tensor) -> Result<TstrReport> {
    let device = model.device();
    let vs = VarStore::new(device);
    let classifier = Classifier::new(
        &vs.root(),
        ClassifierConfig {
            num_channels: model.num_channels(),
            num_classes: model.num_classes(),
            ..Default::default()
        },
    );
    let mut optimizer = nn::Adam::default()
        .build(&vs, TSTR_LEARNING_RATE)
        .context("building TSTR optimizer")?;

    let batch_size = synthetic.size()[0];
    let labels = Tensor::full([batch_size], model.class_label(), (Kind::Int64, device));

    let mut final_loss = 0.0;
    for _ in 0..TSTR_STEPS {
        let logits = classifier.forward_t(synthetic, true);
        let loss = logits.cross_entropy_for_logits(&labels);

        optimizer.zero_grad();
        loss.backward();
        optimizer.step();

        final_loss = loss.double_value(&[]);
    }

    let real_data_accuracy = tch::no_grad(|| {
        classifier
            .predict(model.real_data())
            .eq(model.class_label())
            .to_kind(Kind::Float)
            .mean(Kind::Float)
            .double_value(&[])
    });

    info!(
        "TSTR classifier: final loss {:.4}, accuracy on real data {:.4}",
        final_loss, real_data_accuracy
    );

    Ok(TstrReport {
        final_loss,
        real_data_accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn test_tstr_training_runs() {
        let (model, _config, _dir) = test_support::tiny_model();

        let synthetic = model.generate(6);
        let report = train_tstr_classifier(&model, &synthetic).unwrap();

        assert!(report.final_loss >= 0.0);
        assert!((0.0..=1.0).contains(&report.real_data_accuracy));
    }

    #[test]
    fn test_tstr_does_not_touch_model_weights() {
        let (model, _config, _dir) = test_support::tiny_model();

        let before: Vec<(String, Tensor)> = model
            .classifier_vars()
            .variables()
            .iter()
            .map(|(name, value)| (name.clone(), value.copy()))
            .collect();

        let synthetic = model.generate(6);
        train_tstr_classifier(&model, &synthetic).unwrap();

        let after = model.classifier_vars().variables();
        for (name, old) in &before {
            assert!(after.get(name).unwrap().equal(old));
        }
    }
}
