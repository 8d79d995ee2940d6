//! Data module for labeled sensor sequences
//!
//! This module provides:
//! - CSV loading with shape validation
//! - Integer and one-hot labels
//! - Class filtering and with-replacement batch sampling

mod dataset;

pub use dataset::{sample_rows_with_replacement, to_tensor, SequenceDataset};
