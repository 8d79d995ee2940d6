//! Loss functions for GAN training
//!
//! Binary cross-entropy for the adversarial branches, categorical
//! cross-entropy against one-hot targets for classifier guidance, and the
//! Euclidean feature distance used for statistical regularization.

use tch::{Device, Kind, Tensor};

/// Binary cross-entropy over logits.
pub fn binary_cross_entropy(logits: &Tensor, targets: &Tensor) -> Tensor {
    logits.binary_cross_entropy_with_logits::<Tensor>(targets, None, None, tch::Reduction::Mean)
}

/// Categorical cross-entropy between logits and one-hot targets.
pub fn categorical_cross_entropy(logits: &Tensor, onehot_targets: &Tensor) -> Tensor {
    let log_probs = logits.log_softmax(-1, Kind::Float);
    -(onehot_targets * log_probs)
        .sum_dim_intlist(-1, false, Kind::Float)
        .mean(Kind::Float)
}

/// Mean per-row Euclidean distance between two feature batches.
pub fn euclidean_distance(a: &Tensor, b: &Tensor) -> Tensor {
    (a - b)
        .square()
        .sum_dim_intlist(-1, false, Kind::Float)
        .sqrt()
        .mean(Kind::Float)
}

/// Constant-zero loss for a disabled branch; contributes no gradient.
pub fn null_loss(device: Device) -> Tensor {
    Tensor::zeros([], (Kind::Float, device))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_cross_entropy_positive() {
        let logits = Tensor::randn([4, 1], (Kind::Float, Device::Cpu));
        let targets = Tensor::ones([4, 1], (Kind::Float, Device::Cpu));
        let loss = binary_cross_entropy(&logits, &targets);

        assert_eq!(loss.size(), Vec::<i64>::new());
        assert!(loss.double_value(&[]) > 0.0);
    }

    #[test]
    fn test_categorical_cross_entropy_prefers_correct_logits() {
        let targets = Tensor::from_slice(&[1.0f32, 0.0, 0.0, 1.0]).reshape([2, 2]);
        let confident = Tensor::from_slice(&[8.0f32, -8.0, -8.0, 8.0]).reshape([2, 2]);
        let wrong = Tensor::from_slice(&[-8.0f32, 8.0, 8.0, -8.0]).reshape([2, 2]);

        let good = categorical_cross_entropy(&confident, &targets).double_value(&[]);
        let bad = categorical_cross_entropy(&wrong, &targets).double_value(&[]);
        assert!(good < bad);
        assert!(good < 0.01);
    }

    #[test]
    fn test_euclidean_distance_identical_is_zero() {
        let a = Tensor::randn([6, 12], (Kind::Float, Device::Cpu));
        let distance = euclidean_distance(&a, &a).double_value(&[]);
        assert!(distance.abs() < 1e-6);
    }

    #[test]
    fn test_null_loss_is_zero() {
        let loss = null_loss(Device::Cpu);
        assert_eq!(loss.double_value(&[]), 0.0);
    }
}
