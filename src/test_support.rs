//! Shared fixtures for unit tests: a small deterministic dataset, a
//! configuration pointing into a temp directory, and a freshly saved
//! classifier so model construction can exercise the real load path.

use ndarray::Array3;
use tch::nn::VarStore;
use tempfile::TempDir;

use crate::data::SequenceDataset;
use crate::model::{Classifier, ClassifierConfig, GanModel};
use crate::utils::config::{Config, DataConfig, Names, TrainingParameters, Weights};

pub(crate) const SEQ_LENGTH: usize = 16;
pub(crate) const NUM_CHANNELS: usize = 3;
pub(crate) const NUM_CLASSES: i64 = 2;

/// Twelve deterministic windows, labels alternating between two classes.
pub(crate) fn tiny_dataset() -> SequenceDataset {
    let sequences = Array3::<f32>::from_shape_fn((12, SEQ_LENGTH, NUM_CHANNELS), |(s, t, c)| {
        let phase = (s * 7 + c * 3) as f32;
        (t as f32 * 0.4 + phase).sin() * 0.8
    });
    let labels: Vec<i64> = (0..12).map(|s| (s % 2) as i64).collect();
    SequenceDataset::from_parts(sequences, labels).unwrap()
}

/// Dataset plus a config whose classifier path points at a freshly saved
/// classifier inside the temp directory.
pub(crate) fn tiny_fixture() -> (SequenceDataset, Config, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let classifier_path = dir.path().join("classifier.pt");

    let vs = VarStore::new(tch::Device::Cpu);
    let _classifier = Classifier::new(
        &vs.root(),
        ClassifierConfig {
            num_channels: NUM_CHANNELS as i64,
            num_classes: NUM_CLASSES,
            ..Default::default()
        },
    );
    vs.save(&classifier_path).unwrap();

    let config = Config {
        data: DataConfig {
            data_path: dir.path().join("data.csv").to_string_lossy().into_owned(),
            classifier_path: classifier_path.to_string_lossy().into_owned(),
            class_label: 0,
            sampling_rate: 50.0,
            save_directory: dir.path().join("output").to_string_lossy().into_owned(),
            request_save: false,
            write_train_results: false,
            results_path: dir.path().join("results.csv").to_string_lossy().into_owned(),
        },
        training: TrainingParameters {
            batch_size: 4,
            test_size: 6,
            latent_dimension: 8,
            generator_learning_rate: 1e-3,
            accuracy_threshold: 0.95,
            epoch_threshold: 3,
            real_synthetic_ratio: 2,
            synthetic_synthetic_ratio: 2,
            num_features: 4,
            device: "cpu".to_string(),
        },
        weights: Weights {
            discriminator_loss_weight: 1.0,
            classifier_loss_weight: 1.0,
            sfd_loss_weight: 1.0,
            discriminator_learning_rate: 1e-3,
        },
        names: Names {
            classifier_name: "test-classifier".to_string(),
        },
        model_data: None,
    };

    (tiny_dataset(), config, dir)
}

/// Fully constructed model over the tiny fixture.
pub(crate) fn tiny_model() -> (GanModel, Config, TempDir) {
    tiny_model_with_config(|_| {})
}

/// Same as [`tiny_model`] with a config hook applied before construction.
pub(crate) fn tiny_model_with_config<F: FnOnce(&mut Config)>(mutate: F) -> (GanModel, Config, TempDir) {
    let (dataset, mut config, dir) = tiny_fixture();
    mutate(&mut config);
    let model = GanModel::from_dataset(&dataset, &config, false).unwrap();
    (model, config, dir)
}

/// Zero every parameter in the store, in place.
pub(crate) fn zero_vars(vs: &VarStore) {
    let _guard = tch::no_grad_guard();
    for (_name, mut var) in vs.variables() {
        let _ = var.fill_(0.0);
    }
}

/// Push the classifier's output bias toward one class. With zeroed weights
/// this makes the classifier predict that class for any input.
pub(crate) fn bias_classifier_toward(vs: &VarStore, class: i64) {
    let _guard = tch::no_grad_guard();
    let vars = vs.variables();
    let bias = vars.get("fc.bias").expect("classifier output bias");
    let mut target = bias.narrow(0, class, 1);
    let _ = target.fill_(5.0);
}
