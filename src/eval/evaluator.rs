//! Evaluation pipeline
//!
//! Stateless, read-only computations over the current model snapshot:
//! synthetic sample generation, classifier accuracy against the target
//! class, similarity metrics, and statistical feature distance. Nothing
//! here mutates model weights.

use tch::{Kind, Tensor};

use crate::model::GanModel;
use crate::training::euclidean_distance;
use crate::utils::config::TrainingParameters;

use super::similarity;

/// Results of one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationReport {
    /// Classifier accuracy on synthetic data vs the target class
    pub classifier_accuracy: f64,
    /// Mean real-to-synthetic similarity
    pub mean_rts_similarity: f64,
    /// Mean synthetic-to-synthetic similarity
    pub mean_sts_similarity: f64,
    /// Euclidean distance to the cached test reference features
    pub statistical_feature_distance: f64,
}

/// Generate `size` synthetic sequences from fresh latent vectors.
pub fn generate_synthetic_data(model: &GanModel, size: i64) -> Tensor {
    model.generate(size)
}

/// Fraction of `synthetic` sequences the classifier assigns to the target class.
pub fn classifier_accuracy(model: &GanModel, synthetic: &Tensor) -> f64 {
    tch::no_grad(|| {
        let predicted = model.classifier.predict(synthetic);
        predicted
            .eq(model.class_label())
            .to_kind(Kind::Float)
            .mean(Kind::Float)
            .double_value(&[])
    })
}

/// Distance between the synthetic batch's features and the cached
/// test-size reference vector, using the same measure as the training loss.
pub fn statistical_feature_distance(model: &GanModel, synthetic: &Tensor) -> f64 {
    tch::no_grad(|| {
        let features = model.feature_net.forward(synthetic);
        euclidean_distance(&features, &model.reference().test).double_value(&[])
    })
}

/// Run the full evaluation pipeline once.
pub fn evaluate(model: &GanModel, params: &TrainingParameters) -> EvaluationReport {
    let synthetic = generate_synthetic_data(model, params.test_size);

    let classifier_accuracy = classifier_accuracy(model, &synthetic);
    let (mean_rts_similarity, mean_sts_similarity) = similarity::compute_similarity_metrics(
        &synthetic,
        model.real_data(),
        params.real_synthetic_ratio,
        params.synthetic_synthetic_ratio,
    );
    let statistical_feature_distance = statistical_feature_distance(model, &synthetic);

    EvaluationReport {
        classifier_accuracy,
        mean_rts_similarity,
        mean_sts_similarity,
        statistical_feature_distance,
    }
}
