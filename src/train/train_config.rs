use crate::loss::loss_type::LossType;

/// Samples per mini-batch. Training needs at least this many samples, and
/// the trailing `n % BATCH_SIZE` samples of each shuffled epoch are skipped.
pub const BATCH_SIZE: usize = 64;

/// Epoch loss is logged at `info` level every this many epochs, and for the
/// final epoch.
pub const LOG_INTERVAL: usize = 100;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`       : total number of full passes over the training data
/// - `learning_rate`: SGD step size
/// - `loss_type`    : which loss function to use (`Mse` or `CrossEntropy`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub loss_type: LossType,
}

impl TrainConfig {
    pub fn new(epochs: usize, learning_rate: f64, loss_type: LossType) -> Self {
        TrainConfig {
            epochs,
            learning_rate,
            loss_type,
        }
    }
}
