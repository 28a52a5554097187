use serde::{Serialize, Deserialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

use super::{CrossEntropyLoss, MseLoss};

/// Selects which loss function the training loop uses.
///
/// - `Mse`         : Mean-squared error; pair with Sigmoid or ReLU output.
/// - `CrossEntropy`: Categorical cross-entropy; pair with Softmax output.
///   The gradient is the combined Softmax+CE gradient (predicted - expected) / N.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    CrossEntropy,
}

impl LossType {
    pub fn loss(&self, predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        match self {
            LossType::Mse => MseLoss::loss(predicted, expected),
            LossType::CrossEntropy => CrossEntropyLoss::loss(predicted, expected),
        }
    }

    pub fn derivative(&self, predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        match self {
            LossType::Mse => MseLoss::derivative(predicted, expected),
            LossType::CrossEntropy => CrossEntropyLoss::derivative(predicted, expected),
        }
    }
}

impl FromStr for LossType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mse" | "mean_squared_error" => Ok(LossType::Mse),
            "cross_entropy" | "crossentropy" | "ce" => Ok(LossType::CrossEntropy),
            _ => Err(Error::UnknownLoss(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loss_names() {
        assert_eq!("mse".parse::<LossType>().unwrap(), LossType::Mse);
        assert_eq!("cross_entropy".parse::<LossType>().unwrap(), LossType::CrossEntropy);
        assert!(matches!("hinge".parse::<LossType>(), Err(Error::UnknownLoss(_))));
    }

    #[test]
    fn dispatches_to_matching_loss() {
        let pred = Matrix::column(vec![0.25, 0.75]);
        let target = Matrix::column(vec![0.0, 1.0]);
        assert_eq!(
            LossType::Mse.loss(&pred, &target).unwrap(),
            MseLoss::loss(&pred, &target).unwrap()
        );
        assert_eq!(
            LossType::CrossEntropy.derivative(&pred, &target).unwrap(),
            CrossEntropyLoss::derivative(&pred, &target).unwrap()
        );
    }
}
