//! Evaluation module
//!
//! This module provides:
//! - The evaluation pipeline over a model snapshot
//! - RTS/STS similarity metrics
//! - Train-synthetic-test-real classifier training

mod evaluator;
mod similarity;
mod tstr;

pub use evaluator::{classifier_accuracy, evaluate, generate_synthetic_data, statistical_feature_distance, EvaluationReport};
pub use similarity::compute_similarity_metrics;
pub use tstr::{train_tstr_classifier, TstrReport};
