//! Per-epoch training metrics
//!
//! Every epoch produces one record with each metric under its own named
//! field. The history backs the stopping decision, the results log, and
//! the accuracy progression chart.

use anyhow::Result;
use std::path::Path;

/// Metrics for one training epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochRecord {
    /// Epoch index, starting at 1
    pub epoch: usize,
    /// Discriminator accuracy on its own training batch
    pub discriminator_accuracy: f64,
    /// Fraction of generated samples the discriminator called real
    pub generator_discriminator_accuracy: f64,
    /// Classifier accuracy on generated samples vs the target class
    pub generator_classifier_accuracy: f64,
    /// Mean real-to-synthetic similarity
    pub mean_rts_similarity: f64,
    /// Mean synthetic-to-synthetic similarity
    pub mean_sts_similarity: f64,
}

/// Ordered collection of epoch records.
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    records: Vec<EpochRecord>,
}

impl TrainingHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch record
    pub fn push(&mut self, record: EpochRecord) {
        self.records.push(record);
    }

    /// Number of recorded epochs
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in epoch order
    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    /// Most recent record
    pub fn last(&self) -> Option<&EpochRecord> {
        self.records.last()
    }

    /// Save the history to a CSV file
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;

        writer.write_record([
            "epoch",
            "discriminator_accuracy",
            "generator_discriminator_accuracy",
            "generator_classifier_accuracy",
            "mean_rts_similarity",
            "mean_sts_similarity",
        ])?;

        for record in &self.records {
            writer.write_record([
                record.epoch.to_string(),
                record.discriminator_accuracy.to_string(),
                record.generator_discriminator_accuracy.to_string(),
                record.generator_classifier_accuracy.to_string(),
                record.mean_rts_similarity.to_string(),
                record.mean_sts_similarity.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(epoch: usize) -> EpochRecord {
        EpochRecord {
            epoch,
            discriminator_accuracy: 0.6,
            generator_discriminator_accuracy: 0.4,
            generator_classifier_accuracy: 0.5,
            mean_rts_similarity: 0.7,
            mean_sts_similarity: 0.8,
        }
    }

    #[test]
    fn test_history_push_and_last() {
        let mut history = TrainingHistory::new();
        assert!(history.is_empty());

        history.push(record(1));
        history.push(record(2));

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().epoch, 2);
    }

    #[test]
    fn test_history_save_csv() {
        let mut history = TrainingHistory::new();
        history.push(record(1));

        let file = tempfile::NamedTempFile::new().unwrap();
        history.save_csv(file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.starts_with("epoch,"));
        assert_eq!(contents.lines().count(), 2);
    }
}
