//! Persistence helpers
//!
//! Network weight save/load, the append-mode results log, and synthetic
//! sample export. Every failure here is fatal to the run; there are no
//! retries.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tch::{nn::VarStore, Tensor};
use tracing::info;

use crate::training::EpochRecord;

/// Save a network's parameter store under `directory/filename`.
pub fn save_network(vs: &VarStore, directory: &str, filename: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("creating model directory {}", directory))?;
    let path = Path::new(directory).join(filename);
    vs.save(&path)
        .with_context(|| format!("saving network weights to {}", path.display()))?;
    info!("Saved network weights to {}", path.display());
    Ok(path)
}

/// Load a network's parameter store from `directory/filename`.
pub fn load_network(vs: &mut VarStore, directory: &str, filename: &str) -> Result<()> {
    let path = Path::new(directory).join(filename);
    vs.load(&path)
        .with_context(|| format!("loading network weights from {}", path.display()))?;
    info!("Loaded network weights from {}", path.display());
    Ok(())
}

/// Append one epoch's metrics to the results log, creating the file (and
/// its header) on first use.
pub fn append_results(path: &str, class_label: i64, record: &EpochRecord) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating results directory {}", parent.display()))?;
        }
    }

    let write_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening results log {}", path))?;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if write_header {
        writer.write_record([
            "epoch",
            "class_label",
            "discriminator_accuracy",
            "generator_discriminator_accuracy",
            "generator_classifier_accuracy",
            "mean_rts_similarity",
            "mean_sts_similarity",
        ])?;
    }
    writer.write_record([
        record.epoch.to_string(),
        class_label.to_string(),
        record.discriminator_accuracy.to_string(),
        record.generator_discriminator_accuracy.to_string(),
        record.generator_classifier_accuracy.to_string(),
        record.mean_rts_similarity.to_string(),
        record.mean_sts_similarity.to_string(),
    ])?;
    writer.flush()?;
    Ok(())
}

/// Write one synthetic sample batch to a CSV file in `directory`.
///
/// Rows carry `sample_id, timestep, <one column per channel>`; the file
/// name records the sample index, class label, and the classifier accuracy
/// measured on the batch.
pub fn save_data_sample(
    sample: &Tensor,
    index: usize,
    class_label: i64,
    accuracy: f64,
    directory: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("creating sample directory {}", directory))?;

    let size = sample.size();
    let (num_samples, seq_length, num_channels) = (size[0] as usize, size[1] as usize, size[2] as usize);
    let values: Vec<f32> = sample
        .flatten(0, -1)
        .try_into()
        .context("reading synthetic sample values")?;

    let path = Path::new(directory).join(format!(
        "sample_{:02}_class{}_acc{:.3}.csv",
        index, class_label, accuracy
    ));
    let mut writer = csv::Writer::from_path(&path)?;

    let mut header = vec!["sample_id".to_string(), "timestep".to_string()];
    for channel in 0..num_channels {
        header.push(format!("ch{}", channel));
    }
    writer.write_record(&header)?;

    for s in 0..num_samples {
        for t in 0..seq_length {
            let base = s * seq_length * num_channels + t * num_channels;
            let mut row = vec![s.to_string(), t.to_string()];
            for c in 0..num_channels {
                row.push(values[base + c].to_string());
            }
            writer.write_record(&row)?;
        }
    }

    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    fn record() -> EpochRecord {
        EpochRecord {
            epoch: 3,
            discriminator_accuracy: 0.5,
            generator_discriminator_accuracy: 0.4,
            generator_classifier_accuracy: 0.6,
            mean_rts_similarity: 0.7,
            mean_sts_similarity: 0.8,
        }
    }

    #[test]
    fn test_append_results_creates_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let path_str = path.to_str().unwrap();

        append_results(path_str, 1, &record()).unwrap();
        append_results(path_str, 1, &record()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,class_label"));
        assert!(lines[1].starts_with("3,1,"));
    }

    #[test]
    fn test_save_data_sample_layout() {
        let dir = tempfile::tempdir().unwrap();
        let sample = Tensor::randn([2, 4, 3], (Kind::Float, Device::Cpu));

        let path = save_data_sample(&sample, 1, 0, 0.75, dir.path().to_str().unwrap()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();

        // header plus 2 * 4 rows
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "sample_id,timestep,ch0,ch1,ch2");
    }

    #[test]
    fn test_save_and_load_network_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let device = Device::Cpu;

        let vs = VarStore::new(device);
        let _layer = tch::nn::linear(&vs.root() / "fc", 4, 2, Default::default());
        save_network(&vs, dir.path().to_str().unwrap(), "net.pt").unwrap();

        let mut other = VarStore::new(device);
        let _other_layer = tch::nn::linear(&other.root() / "fc", 4, 2, Default::default());
        load_network(&mut other, dir.path().to_str().unwrap(), "net.pt").unwrap();

        let left = vs.variables();
        let right = other.variables();
        for (name, value) in left.iter() {
            assert!(right.get(name).unwrap().equal(value));
        }
    }

    #[test]
    fn test_load_missing_network_fails() {
        let mut vs = VarStore::new(Device::Cpu);
        assert!(load_network(&mut vs, "/nonexistent", "net.pt").is_err());
    }
}
