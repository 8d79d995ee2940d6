//! GAN trainer for synthetic sensor data
//!
//! Command line entry point. Two modes:
//! - load a pretrained model and run the evaluation pipeline once
//! - train a fresh model, then optionally save it, chart the accuracy
//!   progression, and export synthetic sample batches

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sensor_gan::eval;
use sensor_gan::model::GanModel;
use sensor_gan::training::{GanTrainer, StopReason};
use sensor_gan::utils::config::Config;
use sensor_gan::utils::{persist, plot};

/// Train a GAN that synthesizes labeled multi-channel sensor data
#[derive(Parser)]
#[command(name = "sensor-gan")]
#[command(version = "0.1.0")]
#[command(about = "Generate synthetic sensor time series with a label-conditioned GAN")]
struct Cli {
    /// Save the trained generator and discriminator on completion
    #[arg(short, long)]
    save: bool,

    /// Export synthetic sample batches after the run
    #[arg(short = 'S', long)]
    save_samples: bool,

    /// Load a pretrained model and only run the evaluation pipeline
    #[arg(short, long)]
    load: bool,

    /// Train the generator without classifier guidance
    #[arg(short = 'C', long)]
    ignore_classifier: bool,

    /// Train the generator without statistical feature regularization
    #[arg(short = 'R', long)]
    ignore_regularization: bool,

    /// Number of sample batches to export
    #[arg(short, long, default_value = "5")]
    count: usize,

    /// Render the accuracy progression chart
    #[arg(short = 'p', long)]
    show_plot: bool,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    /// Path to the TOML configuration file
    config: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_toml(&cli.config)?;
    config.validate()?;

    let model = GanModel::new(&config, cli.load)?;

    if cli.load {
        run_evaluation(&model, &config)?;
    } else {
        run_training(&cli, &config, &model)?;
    }

    if cli.save_samples {
        export_data_samples(&model, &config, cli.count)?;
    }

    Ok(())
}

/// Evaluate a pretrained model once and report its metrics.
fn run_evaluation(model: &GanModel, config: &Config) -> Result<()> {
    let report = eval::evaluate(model, &config.training);

    info!("Classifier accuracy for synthetic data: {:.4}", report.classifier_accuracy);
    info!("RTS similarity: {:.4}", report.mean_rts_similarity);
    info!("STS similarity: {:.4}", report.mean_sts_similarity);
    info!(
        "Statistical Feature Distance (SFD): {:.4}",
        report.statistical_feature_distance
    );

    let synthetic = model.generate(config.training.test_size);
    let tstr = eval::train_tstr_classifier(model, &synthetic)?;
    info!("TSTR classifier accuracy on real data: {:.4}", tstr.real_data_accuracy);

    Ok(())
}

/// Run the training loop and handle post-run saving and plotting.
fn run_training(cli: &Cli, config: &Config, model: &GanModel) -> Result<()> {
    let mut trainer = GanTrainer::new(model, config, cli.ignore_classifier, cli.ignore_regularization)?;
    let outcome = trainer.train(model)?;

    match outcome {
        StopReason::Converged => info!("Training converged"),
        StopReason::EpochLimitReached => info!("Training stopped at the epoch threshold"),
    }

    if config.data.request_save || cli.save {
        let (directory, generator_filename, discriminator_filename) = match &config.model_data {
            Some(md) => (
                md.directory.as_str(),
                md.generator_filename.as_str(),
                md.discriminator_filename.as_str(),
            ),
            None => (config.data.save_directory.as_str(), "generator.pt", "discriminator.pt"),
        };
        model.save_networks(directory, generator_filename, discriminator_filename)?;
    }

    if cli.show_plot {
        std::fs::create_dir_all(&config.data.save_directory)?;
        let path = Path::new(&config.data.save_directory).join("accuracy_progression.png");
        plot::plot_accuracy_progression(trainer.history(), &path)?;
        info!("Saved accuracy progression chart to {}", path.display());
    }

    Ok(())
}

/// Export `count` synthetic sample batches plus one real reference window.
fn export_data_samples(model: &GanModel, config: &Config, count: usize) -> Result<()> {
    let directory = &config.data.save_directory;
    let sampling_rate = config.data.sampling_rate;
    let class_label = model.class_label();

    for index in 1..=count {
        let synthetic = model.generate(config.training.test_size);
        let accuracy = eval::classifier_accuracy(model, &synthetic);
        let path = persist::save_data_sample(&synthetic, index, class_label, accuracy, directory)?;
        info!("Saved synthetic sample batch to {}", path.display());

        let window = synthetic.get(0);
        let plot_path = Path::new(directory).join(format!("sample_{:02}_class{}.png", index, class_label));
        plot::plot_sequence(
            &window,
            sampling_rate,
            &format!("Synthetic data for label class {}", class_label),
            &plot_path,
        )?;
    }

    let real = model.random_real_segment();
    let real_path = Path::new(directory).join(format!("real_class{}.png", class_label));
    plot::plot_sequence(
        &real,
        sampling_rate,
        &format!("Real data for label class {}", class_label),
        &real_path,
    )?;
    info!("Saved real reference plot to {}", real_path.display());

    Ok(())
}
