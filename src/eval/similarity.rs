//! Pairwise similarity metrics
//!
//! Real-to-synthetic (RTS) and synthetic-to-synthetic (STS) similarity.
//! Each synthetic window is compared against a small random sample of
//! counterparts (the configured ratios) using cosine similarity over the
//! flattened window, and the results are reduced to means.

use rand::Rng;
use tch::{Kind, Tensor};

/// Mean RTS and STS similarity for a synthetic batch.
///
/// # Arguments
///
/// * `synthetic` - Tensor of shape (num_synthetic, seq_length, num_channels)
/// * `real` - Tensor of shape (num_real, seq_length, num_channels)
/// * `real_synthetic_ratio` - real windows sampled per synthetic window
/// * `synthetic_synthetic_ratio` - other synthetic windows sampled per synthetic window
///
/// # Returns
///
/// `(mean_rts, mean_sts)`, each in [-1, 1]
pub fn compute_similarity_metrics(
    synthetic: &Tensor,
    real: &Tensor,
    real_synthetic_ratio: i64,
    synthetic_synthetic_ratio: i64,
) -> (f64, f64) {
    tch::no_grad(|| {
        let syn = synthetic.flatten(1, -1);
        let real_flat = real.flatten(1, -1);
        let num_syn = syn.size()[0];
        let num_real = real_flat.size()[0];
        let device = syn.device();

        let mut rng = rand::thread_rng();
        let mut rts = Vec::with_capacity(num_syn as usize);
        let mut sts = Vec::with_capacity(num_syn as usize);

        for i in 0..num_syn {
            let window = syn.get(i).unsqueeze(0);

            let real_indices: Vec<i64> = (0..real_synthetic_ratio)
                .map(|_| rng.gen_range(0..num_real))
                .collect();
            let picked = real_flat.index_select(0, &Tensor::from_slice(&real_indices).to_device(device));
            let similarity = Tensor::cosine_similarity(&window, &picked, 1, 1e-8);
            rts.push(similarity.mean(Kind::Float).double_value(&[]));

            // sample other synthetic windows, skipping the window itself
            let syn_indices: Vec<i64> = (0..synthetic_synthetic_ratio)
                .map(|_| {
                    if num_syn < 2 {
                        i
                    } else {
                        let j = rng.gen_range(0..num_syn - 1);
                        if j >= i {
                            j + 1
                        } else {
                            j
                        }
                    }
                })
                .collect();
            let picked = syn.index_select(0, &Tensor::from_slice(&syn_indices).to_device(device));
            let similarity = Tensor::cosine_similarity(&window, &picked, 1, 1e-8);
            sts.push(similarity.mean(Kind::Float).double_value(&[]));
        }

        (mean(&rts), mean(&sts))
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
