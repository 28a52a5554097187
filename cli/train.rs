//! Trains a network on CSV data and writes its weights.
//!
//! Run with:
//!   cargo run --release --bin mlp-train -- --sizes 784,128,10 --activations relu,softmax
//!
//! Feature and label files are `features x samples` and `classes x samples`
//! CSV matrices (one sample per column).

mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use mlp_trainer::{
    load_csv,
    network::{parse_activations, parse_layer_sizes},
    LossType, Network, NetworkConfig, TrainConfig,
};

#[derive(Parser, Debug)]
#[command(version, about = "Train a multilayer perceptron on CSV data")]
struct Args {
    /// Comma-separated layer widths, input first (e.g. 784,128,10).
    #[arg(short, long)]
    sizes: Option<String>,
    /// Comma-separated activations, one per weight layer (sigmoid, relu, softmax).
    #[arg(short, long)]
    activations: Option<String>,
    #[arg(short, long)]
    epochs: Option<usize>,
    #[arg(long, alias = "learning_rate")]
    lr: Option<f64>,
    /// JSON network config; command-line flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "data/train_data.csv")]
    train_data: PathBuf,
    #[arg(long, default_value = "data/train_labels.csv")]
    train_labels: PathBuf,
    /// Number of samples (CSV columns) to read.
    #[arg(long, default_value_t = 60_000)]
    samples: usize,
    #[arg(long, default_value = "weights.bin")]
    weights: PathBuf,
    /// mse or cross_entropy.
    #[arg(long, default_value = "cross_entropy")]
    loss: String,
    /// Training samples used for the final accuracy check.
    #[arg(long, default_value_t = 1000)]
    eval_samples: usize,
    /// Seed for weight initialization and shuffling.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = util::logger::init_log(args.verbose) {
        eprintln!("Error: cannot initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> mlp_trainer::Result<()> {
    let config = build_config(&args)?;
    config.validate()?;
    let loss_type: LossType = args.loss.parse()?;

    let features = config.layer_sizes[0];
    let classes = config.layer_sizes[config.layer_sizes.len() - 1];

    info!("loading {} samples from {}", args.samples, args.train_data.display());
    let train_x = load_csv(&args.train_data, features, args.samples)?;
    let train_y = load_csv(&args.train_labels, classes, args.samples)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut network = Network::from_config(&config, &mut rng)?;
    info!(
        "training {:?} ({} parameters) for {} epochs at lr {}",
        config.layer_sizes,
        network.parameter_count(),
        config.epochs,
        config.learning_rate
    );

    let train_config = TrainConfig::new(config.epochs, config.learning_rate, loss_type);
    let report = network.train_with_rng(&train_x, &train_y, &train_config, &mut rng)?;
    if let Some(loss) = report.final_loss() {
        info!("final epoch loss: {loss:.6}");
    }

    network.save_weights(&args.weights)?;
    info!("Weights saved to {}", args.weights.display());

    let subset = args.eval_samples.min(args.samples);
    if subset > 0 {
        let acc = network.accuracy(
            &train_x.column_slice(0, subset),
            &train_y.column_slice(0, subset),
        )?;
        println!("Accuracy on {subset}-sample subset: {:.2}%", acc * 100.0);
    }

    Ok(())
}

fn build_config(args: &Args) -> mlp_trainer::Result<NetworkConfig> {
    let mut config = match &args.config {
        Some(path) => NetworkConfig::load_json(path)?,
        None => NetworkConfig::default(),
    };
    if let Some(sizes) = &args.sizes {
        config.layer_sizes = parse_layer_sizes(sizes)?;
    }
    if let Some(activations) = &args.activations {
        config.activations = parse_activations(activations)?;
    }
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(lr) = args.lr {
        config.learning_rate = lr;
    }
    Ok(config)
}
