use serde::{Serialize, Deserialize};

/// Per-epoch training statistics recorded by `train_loop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean of the per-batch losses in this epoch.
    pub train_loss: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Everything `train_loop` observed, one entry per completed epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub epochs: Vec<EpochStats>,
    /// Samples skipped at the end of every epoch because they did not fill a
    /// whole batch.
    pub dropped_per_epoch: usize,
}

impl TrainReport {
    /// Mean batch loss of the last epoch, if any epoch ran.
    pub fn final_loss(&self) -> Option<f64> {
        self.epochs.last().map(|s| s.train_loss)
    }
}
