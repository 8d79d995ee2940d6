//! Labeled sequence dataset
//!
//! Real sensor data arrives as fixed-length, fixed-channel-count windows
//! with one class label per window. The dataset is loaded once and is
//! immutable for the rest of the run; every sequence must share the same
//! (seq_length, num_channels) shape or loading fails.

use anyhow::{bail, Context, Result};
use ndarray::{Array2, Array3, Axis};
use rand::Rng;
use std::path::Path;
use tch::{Device, Kind, Tensor};

/// Collection of labeled sensor windows.
///
/// Sequences have shape (num_sequences, seq_length, num_channels); labels
/// are integer class indices with a parallel one-hot encoding.
#[derive(Debug, Clone)]
pub struct SequenceDataset {
    sequences: Array3<f32>,
    labels: Vec<i64>,
    onehot: Array2<f32>,
    num_classes: i64,
}

impl SequenceDataset {
    /// Build a dataset from an in-memory array and per-sequence labels.
    pub fn from_parts(sequences: Array3<f32>, labels: Vec<i64>) -> Result<Self> {
        if sequences.shape()[0] != labels.len() {
            bail!(
                "label count ({}) does not match sequence count ({})",
                labels.len(),
                sequences.shape()[0]
            );
        }
        if labels.is_empty() {
            bail!("dataset contains no sequences");
        }
        if let Some(&bad) = labels.iter().find(|&&l| l < 0) {
            bail!("negative class label {} in dataset", bad);
        }

        let num_classes = labels.iter().copied().max().unwrap_or(0) + 1;
        let mut onehot = Array2::<f32>::zeros((labels.len(), num_classes as usize));
        for (row, &label) in labels.iter().enumerate() {
            onehot[[row, label as usize]] = 1.0;
        }

        Ok(Self {
            sequences,
            labels,
            onehot,
            num_classes,
        })
    }

    /// Load a dataset from a CSV file.
    ///
    /// Expected layout: a header row, then one row per timestep with
    /// columns `sequence_id, timestep, <one column per channel>, label`.
    /// Rows belonging to the same sequence must be contiguous and carry a
    /// consistent label; all sequences must have the same length.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("opening data file {}", path.display()))?;

        let headers = reader.headers()?.clone();
        if headers.len() < 4 {
            bail!(
                "data file {} needs at least 4 columns (sequence_id, timestep, channels, label)",
                path.display()
            );
        }
        let num_channels = headers.len() - 3;

        let mut sequences: Vec<Vec<Vec<f32>>> = Vec::new();
        let mut labels: Vec<i64> = Vec::new();
        let mut current_id: Option<i64> = None;
        let mut current_rows: Vec<Vec<f32>> = Vec::new();
        let mut current_label: i64 = 0;
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("reading row {} of {}", line + 2, path.display()))?;
            let id: i64 = record[0]
                .parse()
                .with_context(|| format!("bad sequence_id at row {}", line + 2))?;
            let label: i64 = record[record.len() - 1]
                .parse()
                .with_context(|| format!("bad label at row {}", line + 2))?;
            let mut channels = Vec::with_capacity(num_channels);
            for col in 2..2 + num_channels {
                let value: f32 = record[col]
                    .parse()
                    .with_context(|| format!("bad channel value at row {}", line + 2))?;
                channels.push(value);
            }

            match current_id {
                Some(prev) if prev == id => {
                    if label != current_label {
                        bail!("sequence {} has inconsistent labels ({} vs {})", id, current_label, label);
                    }
                    current_rows.push(channels);
                }
                Some(_) => {
                    sequences.push(std::mem::take(&mut current_rows));
                    labels.push(current_label);
                    current_id = Some(id);
                    current_label = label;
                    current_rows.push(channels);
                }
                None => {
                    current_id = Some(id);
                    current_label = label;
                    current_rows.push(channels);
                }
            }
        }
        if current_id.is_some() {
            sequences.push(current_rows);
            labels.push(current_label);
        }

        if sequences.is_empty() {
            bail!("data file {} contains no sequences", path.display());
        }

        let seq_length = sequences[0].len();
        for (index, seq) in sequences.iter().enumerate() {
            if seq.len() != seq_length {
                bail!(
                    "sequence {} has length {} but expected {}",
                    index,
                    seq.len(),
                    seq_length
                );
            }
        }

        let mut data = Array3::<f32>::zeros((sequences.len(), seq_length, num_channels));
        for (s, seq) in sequences.iter().enumerate() {
            for (t, row) in seq.iter().enumerate() {
                for (c, &value) in row.iter().enumerate() {
                    data[[s, t, c]] = value;
                }
            }
        }

        Self::from_parts(data, labels)
    }

    /// Number of sequences in the dataset.
    pub fn num_sequences(&self) -> usize {
        self.sequences.shape()[0]
    }

    /// Length of each sequence.
    pub fn seq_length(&self) -> usize {
        self.sequences.shape()[1]
    }

    /// Number of channels per timestep.
    pub fn num_channels(&self) -> usize {
        self.sequences.shape()[2]
    }

    /// Number of distinct classes implied by the labels.
    pub fn num_classes(&self) -> i64 {
        self.num_classes
    }

    /// Integer labels, one per sequence.
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// One-hot labels of shape (num_sequences, num_classes).
    pub fn onehot(&self) -> &Array2<f32> {
        &self.onehot
    }

    /// All sequences of the given class, as an owned array.
    pub fn class_subset(&self, class_label: i64) -> Result<Array3<f32>> {
        let indices: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class_label)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            bail!("no sequences with class label {} in dataset", class_label);
        }
        Ok(self.sequences.select(Axis(0), &indices))
    }
}

/// Move a host array of sequences onto the given device as a float tensor.
pub fn to_tensor(data: Array3<f32>, device: Device) -> Result<Tensor> {
    let tensor = Tensor::try_from(data).context("converting sequences to tensor")?;
    Ok(tensor.to_kind(Kind::Float).to_device(device))
}

/// Draw `count` rows from `data` uniformly with replacement.
pub fn sample_rows_with_replacement(data: &Tensor, count: i64) -> Tensor {
    let num_rows = data.size()[0];
    let mut rng = rand::thread_rng();
    let indices: Vec<i64> = (0..count).map(|_| rng.gen_range(0..num_rows)).collect();
    let index = Tensor::from_slice(&indices).to_device(data.device());
    data.index_select(0, &index)
}
