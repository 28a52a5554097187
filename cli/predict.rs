//! Runs a saved network on CSV input and prints class probabilities.
//!
//! The architecture is read from the weights file, so only the input
//! matrix needs to be supplied.
//!
//! Run with:
//!   cargo run --release --bin mlp-predict -- --weights weights.bin --input image.csv

mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use mlp_trainer::{load_csv, Network};

#[derive(Parser, Debug)]
#[command(version, about = "Predict classes with a trained multilayer perceptron")]
struct Args {
    #[arg(long, default_value = "weights.bin")]
    weights: PathBuf,
    /// `features x samples` CSV matrix.
    #[arg(long, default_value = "data2/single_image_label_0_9.csv")]
    input: PathBuf,
    /// Number of samples (CSV columns) to read.
    #[arg(long, default_value_t = 1)]
    samples: usize,
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
    let network = Network::load(&args.weights)?;
    let sizes: Vec<usize> = std::iter::once(network.input_size())
        .chain(network.layers().iter().map(|l| l.output_size()))
        .collect();
    info!("loaded network {sizes:?} from {}", args.weights.display());

    let input = load_csv(&args.input, network.input_size(), args.samples)?;
    let output = network.predict(&input)?;

    for sample in 0..output.cols {
        let probabilities = output.col_values(sample);
        println!("Sample {sample}");
        println!("Predicted probabilities:");
        for (class, p) in probabilities.iter().enumerate() {
            println!("  {class}: {p:.6}");
        }
        println!("Sum of probabilities: {:.6}", probabilities.iter().sum::<f64>());
        println!("Predicted class: {}", output.argmax_column(sample));
    }

    Ok(())
}
