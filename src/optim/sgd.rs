use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

use super::optimizer::Optimizer;

/// Plain gradient descent: `W -= lr * dW`, `b -= lr * db`.
///
/// The learning rate is fixed for the lifetime of the value; build a new
/// `Sgd` to change it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Result<Sgd> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and positive, got {learning_rate}"
            )));
        }
        Ok(Sgd { learning_rate })
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

impl Optimizer for Sgd {
    fn update(
        &self,
        weights: &mut Matrix,
        biases: &mut Matrix,
        weights_grad: &Matrix,
        biases_grad: &Matrix,
    ) -> Result<()> {
        weights.sub_scaled_assign(weights_grad, self.learning_rate)?;
        biases.sub_scaled_assign(biases_grad, self.learning_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_against_gradient() {
        let sgd = Sgd::new(0.5).unwrap();
        let mut w = Matrix::filled(2, 2, 1.0);
        let mut b = Matrix::column(vec![0.0, 0.0]);
        let dw = Matrix::from_rows(&[vec![1.0, -1.0], vec![2.0, 0.0]]).unwrap();
        let db = Matrix::column(vec![4.0, -2.0]);

        sgd.update(&mut w, &mut b, &dw, &db).unwrap();

        assert_eq!(w.as_slice(), &[0.5, 1.5, 0.0, 1.0]);
        assert_eq!(b.as_slice(), &[-2.0, 1.0]);
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        assert!(Sgd::new(0.0).is_err());
        assert!(Sgd::new(-0.1).is_err());
        assert!(Sgd::new(f64::NAN).is_err());
    }

    #[test]
    fn gradient_shape_must_match() {
        let sgd = Sgd::new(0.1).unwrap();
        let mut w = Matrix::zeros(2, 2);
        let mut b = Matrix::zeros(2, 1);
        assert!(sgd.update(&mut w, &mut b, &Matrix::zeros(2, 3), &Matrix::zeros(2, 1)).is_err());
    }
}
