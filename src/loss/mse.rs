use crate::error::Result;
use crate::math::matrix::Matrix;

use super::check_shapes;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)^2) over every entry.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        check_shapes("mse loss", predicted, expected)?;
        Ok(predicted.sub(expected)?.map(|d| d * d).mean())
    }

    /// Gradient w.r.t. `predicted`: 2 * (predicted - expected) / N, where N is
    /// the number of samples (columns), not the number of entries.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_shapes("mse derivative", predicted, expected)?;
        let n = predicted.cols as f64;
        Ok(predicted.sub(expected)?.scale(2.0 / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn mse_is_zero_when_equal() {
        let pred = Matrix::from_rows(&[vec![1.0, -2.0], vec![0.5, 3.0]]).unwrap();
        assert_eq!(MseLoss::loss(&pred, &pred).unwrap(), 0.0);
    }

    #[test]
    fn gradient_is_scaled_per_sample() {
        // Two samples, two outputs each.
        let pred = Matrix::from_rows(&[vec![1.0, 3.0], vec![0.0, 0.0]]).unwrap();
        let target = Matrix::from_rows(&[vec![2.0, 1.0], vec![0.0, 0.0]]).unwrap();

        // mean([1, 4, 0, 0]) = 1.25
        assert!((MseLoss::loss(&pred, &target).unwrap() - 1.25).abs() < 1e-12);

        let grad = MseLoss::derivative(&pred, &target).unwrap();
        assert_eq!(grad.as_slice(), &[-1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let pred = Matrix::zeros(2, 3);
        let target = Matrix::zeros(3, 2);
        assert!(matches!(MseLoss::loss(&pred, &target), Err(Error::ShapeMismatch { .. })));
        assert!(MseLoss::derivative(&pred, &target).is_err());
    }
}
