use std::time::Instant;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::network::{check_dataset, Network};
use crate::train::epoch_stats::{EpochStats, TrainReport};
use crate::train::train_config::{TrainConfig, BATCH_SIZE, LOG_INTERVAL};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs of mini-batch SGD.
///
/// # Arguments
/// - `network`: mutable reference to the network; modified in place
/// - `inputs` : design matrix, one sample per column (`features x samples`)
/// - `labels` : target matrix, one sample per column (`outputs x samples`)
/// - `config` : epochs, learning rate and loss
/// - `rng`    : source for the per-epoch shuffle
///
/// Every epoch permutes the sample columns (inputs and labels together),
/// then runs whole batches of `BATCH_SIZE` columns in order. Samples left
/// over after the last whole batch are not used that epoch.
///
/// # Errors
/// - `InvalidInput` if the data is empty, has fewer than `BATCH_SIZE`
///   samples, or inputs and labels disagree on the sample count
/// - `ShapeMismatch` if the feature or label rows do not match the network
/// - `InvalidConfig` for zero epochs or a non-positive learning rate
pub fn train_loop<R: Rng + ?Sized>(
    network: &mut Network,
    inputs: &Matrix,
    labels: &Matrix,
    config: &TrainConfig,
    rng: &mut R,
) -> Result<TrainReport> {
    check_dataset(inputs, labels, "training")?;
    if inputs.rows != network.input_size() {
        return Err(Error::ShapeMismatch {
            context: "training inputs",
            expected: (network.input_size(), inputs.cols),
            actual: inputs.shape(),
        });
    }
    if labels.rows != network.output_size() {
        return Err(Error::ShapeMismatch {
            context: "training labels",
            expected: (network.output_size(), labels.cols),
            actual: labels.shape(),
        });
    }
    let n = inputs.cols;
    if n < BATCH_SIZE {
        return Err(Error::InvalidInput(format!(
            "not enough samples to form a single batch: {n} < {BATCH_SIZE}"
        )));
    }
    if config.epochs == 0 {
        return Err(Error::InvalidConfig("epochs must be positive".into()));
    }

    let num_batches = n / BATCH_SIZE;
    let dropped = n % BATCH_SIZE;
    if dropped > 0 {
        debug!("{dropped} trailing samples are skipped each epoch");
    }

    let mut report = TrainReport {
        epochs: Vec::with_capacity(config.epochs),
        dropped_per_epoch: dropped,
    };

    for epoch in 0..config.epochs {
        let t_start = Instant::now();

        let train_loss = run_one_epoch(network, inputs, labels, config, num_batches, rng)?;

        if epoch % LOG_INTERVAL == 0 || epoch == config.epochs - 1 {
            info!("Epoch {epoch}, Loss: {train_loss:.6}");
        }

        report.epochs.push(EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        });
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Applies one random permutation to the columns of both matrices, so every
/// sample stays paired with its label.
fn shuffle_columns<R: Rng + ?Sized>(inputs: &Matrix, labels: &Matrix, rng: &mut R) -> (Matrix, Matrix) {
    let mut indices: Vec<usize> = (0..inputs.cols).collect();
    indices.shuffle(rng);
    (inputs.select_columns(&indices), labels.select_columns(&indices))
}

/// Shuffles the dataset and runs `num_batches` whole batches over it.
/// Returns the mean of the batch losses.
fn run_one_epoch<R: Rng + ?Sized>(
    network: &mut Network,
    inputs: &Matrix,
    labels: &Matrix,
    config: &TrainConfig,
    num_batches: usize,
    rng: &mut R,
) -> Result<f64> {
    let (shuffled_inputs, shuffled_labels) = shuffle_columns(inputs, labels, rng);

    let mut epoch_loss = 0.0;
    for batch in 0..num_batches {
        let start = batch * BATCH_SIZE;
        let x_batch = shuffled_inputs.column_slice(start, BATCH_SIZE);
        let y_batch = shuffled_labels.column_slice(start, BATCH_SIZE);

        let predicted = network.forward(&x_batch)?;
        epoch_loss += config.loss_type.loss(&predicted, &y_batch)?;
        let d_output = config.loss_type.derivative(&predicted, &y_batch)?;
        network.backward(config.learning_rate, &d_output)?;
    }

    Ok(epoch_loss / num_batches as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::loss::loss_type::LossType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn net(rng: &mut StdRng) -> Network {
        Network::with_rng(&[2, 3, 2], &[ActivationFunction::Sigmoid, ActivationFunction::Softmax], rng)
            .unwrap()
    }

    fn dataset(n: usize) -> (Matrix, Matrix) {
        let mut x = Matrix::zeros(2, n);
        let mut y = Matrix::zeros(2, n);
        for c in 0..n {
            let v = c as f64 / n as f64;
            x.set(0, c, v);
            x.set(1, c, 1.0 - v);
            y.set(if v < 0.5 { 0 } else { 1 }, c, 1.0);
        }
        (x, y)
    }

    #[test]
    fn fewer_samples_than_a_batch_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut network = net(&mut rng);
        let (x, y) = dataset(BATCH_SIZE - 1);
        let config = TrainConfig::new(1, 0.1, LossType::CrossEntropy);
        let err = train_loop(&mut network, &x, &y, &config, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn empty_data_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut network = net(&mut rng);
        let config = TrainConfig::new(1, 0.1, LossType::CrossEntropy);
        let err = train_loop(&mut network, &Matrix::zeros(2, 0), &Matrix::zeros(2, 0), &config, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn label_rows_must_match_output_width() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut network = net(&mut rng);
        let (x, _) = dataset(BATCH_SIZE);
        let config = TrainConfig::new(1, 0.1, LossType::CrossEntropy);
        let err = train_loop(&mut network, &x, &Matrix::zeros(3, BATCH_SIZE), &config, &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn report_counts_skipped_samples() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut network = net(&mut rng);
        let (x, y) = dataset(BATCH_SIZE * 2 + 10);
        let config = TrainConfig::new(3, 0.1, LossType::CrossEntropy);
        let report = train_loop(&mut network, &x, &y, &config, &mut rng).unwrap();
        assert_eq!(report.dropped_per_epoch, 10);
        assert_eq!(report.epochs.len(), 3);
        assert_eq!(report.epochs[2].epoch, 2);
        assert_eq!(report.epochs[2].total_epochs, 3);
    }

    #[test]
    fn trailing_partial_batch_is_dropped() {
        let (x, y) = dataset(BATCH_SIZE + 7);
        let config = TrainConfig::new(1, 0.5, LossType::CrossEntropy);
        let mut trained = net(&mut StdRng::seed_from_u64(1));
        let mut expected = trained.clone();

        train_loop(&mut trained, &x, &y, &config, &mut StdRng::seed_from_u64(5)).unwrap();

        // Same permutation, then a single step on the first whole batch only.
        let (sx, sy) = shuffle_columns(&x, &y, &mut StdRng::seed_from_u64(5));
        let x_batch = sx.column_slice(0, BATCH_SIZE);
        let y_batch = sy.column_slice(0, BATCH_SIZE);
        let out = expected.forward(&x_batch).unwrap();
        let grad = config.loss_type.derivative(&out, &y_batch).unwrap();
        expected.backward(config.learning_rate, &grad).unwrap();

        for (a, b) in trained.layers().iter().zip(expected.layers()) {
            assert_eq!(a.weights(), b.weights());
            assert_eq!(a.biases(), b.biases());
        }
    }

    #[test]
    fn shuffle_columns_keeps_samples_with_labels() {
        let n = 50;
        let mut x = Matrix::zeros(2, n);
        let mut y = Matrix::zeros(1, n);
        for c in 0..n {
            x.set(0, c, c as f64);
            x.set(1, c, -(c as f64));
            y.set(0, c, c as f64 * 10.0);
        }

        let (sx, sy) = shuffle_columns(&x, &y, &mut StdRng::seed_from_u64(3));
        assert_eq!(sx.shape(), (2, n));
        assert_eq!(sy.shape(), (1, n));

        let mut seen = vec![false; n];
        for c in 0..n {
            let id = sx.get(0, c);
            assert_eq!(sx.get(1, c), -id);
            assert_eq!(sy.get(0, c), id * 10.0);
            seen[id as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        // A seeded permutation of 50 columns is not the identity.
        assert_ne!(sx, x);
    }

    #[test]
    fn seeded_runs_are_deterministic() {
        let (x, y) = dataset(BATCH_SIZE * 2);
        let config = TrainConfig::new(5, 0.5, LossType::CrossEntropy);

        let run = || {
            let mut rng = StdRng::seed_from_u64(9);
            let mut network = net(&mut rng);
            let report = train_loop(&mut network, &x, &y, &config, &mut rng).unwrap();
            (report.final_loss(), network.layers()[0].weights().clone())
        };
        assert_eq!(run(), run());
    }
}
