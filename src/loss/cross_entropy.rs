use crate::error::Result;
use crate::math::matrix::Matrix;

use super::check_shapes;

/// Categorical cross-entropy loss for use with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Predictions are clipped to `[EPS, 1 - EPS]` before taking the log.
pub const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// Computes the batch-mean cross-entropy:
    ///   L = -sum(expected * log(clip(predicted))) / N
    ///
    /// `predicted`: softmax probabilities, one column per sample
    /// `expected` : one-hot (or soft) targets, same shape
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        check_shapes("cross-entropy loss", predicted, expected)?;
        let n = predicted.cols as f64;
        let total: f64 = predicted
            .iter()
            .zip(expected.iter())
            .map(|(&p, &e)| e * p.clamp(EPS, 1.0 - EPS).ln())
            .sum();
        Ok(-total / n)
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the softmax
    /// input: (predicted - expected) / N.
    ///
    /// Only exact when `predicted` comes out of a Softmax layer, whose own
    /// derivative is then the identity.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_shapes("cross-entropy derivative", predicted, expected)?;
        let n = predicted.cols as f64;
        Ok(predicted.sub(expected)?.scale(1.0 / n))
    }
}
