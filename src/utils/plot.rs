//! Chart rendering
//!
//! Renders the per-epoch accuracy progression and per-channel sequence
//! plots to PNG files.

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;
use tch::Tensor;

use crate::training::TrainingHistory;

/// Render the three accuracy series over epochs as a percent chart.
pub fn plot_accuracy_progression(history: &TrainingHistory, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (1200, 900)).into_drawing_area();
    root.fill(&WHITE)?;

    let num_epochs = history.len().max(1) as i32;
    let mut chart = ChartBuilder::on(&root)
        .caption("GAN Accuracy Progression", ("sans-serif", 40))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..(num_epochs + 1), 0f64..100f64)?;

    chart
        .configure_mesh()
        .x_desc("Epochs")
        .y_desc("Model Accuracy (%)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            history
                .records()
                .iter()
                .map(|r| (r.epoch as i32, r.generator_classifier_accuracy * 100.0)),
            &BLUE,
        ))?
        .label("Classifier Accuracy")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            history
                .records()
                .iter()
                .map(|r| (r.epoch as i32, r.discriminator_accuracy * 100.0)),
            &RED,
        ))?
        .label("Discriminator Accuracy")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .draw_series(LineSeries::new(
            history
                .records()
                .iter()
                .map(|r| (r.epoch as i32, r.generator_discriminator_accuracy * 100.0)),
            &GREEN,
        ))?
        .label("Generator-Trick-Discriminator Accuracy")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Render one window as stacked per-channel line plots.
///
/// # Arguments
///
/// * `sequence` - Tensor of shape (seq_length, num_channels)
/// * `sampling_rate` - sensor sampling rate in Hz, for the time axis
pub fn plot_sequence(sequence: &Tensor, sampling_rate: f64, title: &str, path: &Path) -> Result<()> {
    let size = sequence.size();
    let (seq_length, num_channels) = (size[0] as usize, size[1] as usize);
    let values: Vec<f32> = sequence
        .flatten(0, -1)
        .try_into()
        .context("reading sequence values for plotting")?;
    let dt = 1.0 / sampling_rate;

    let root = BitMapBackend::new(path, (1000, 280 * num_channels as u32)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((num_channels, 1));

    for (channel, area) in areas.iter().enumerate() {
        let channel_values: Vec<f64> = (0..seq_length)
            .map(|t| values[t * num_channels + channel] as f64)
            .collect();
        let lo = channel_values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = channel_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let pad = ((hi - lo) * 0.1).max(1e-3);

        let mut chart = ChartBuilder::on(area)
            .caption(if channel == 0 { title } else { "" }, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..(seq_length as f64 * dt), (lo - pad)..(hi + pad))?;

        chart
            .configure_mesh()
            .x_desc("Seconds")
            .y_desc(format!("channel {}", channel))
            .draw()?;

        let color = Palette99::pick(channel);
        chart.draw_series(LineSeries::new(
            channel_values.iter().enumerate().map(|(t, &v)| (t as f64 * dt, v)),
            &color,
        ))?;
    }

    root.present()?;
    Ok(())
}
