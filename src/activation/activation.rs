use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Sigmoid,
    #[serde(rename = "relu")]
    ReLU,
    /// Softmax normalizes each column (sample) into a probability
    /// distribution. It is not element-wise, so it is only meaningful on an
    /// output layer paired with `LossType::CrossEntropy`.
    Softmax,
}

impl ActivationFunction {
    /// Applies the activation to a pre-activation batch `z`.
    pub fn activate(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Sigmoid => z.map(|x| 1.0 / (1.0 + (-x).exp())),
            ActivationFunction::ReLU => z.map(|x| if x > 0.0 { x } else { 0.0 }),
            ActivationFunction::Softmax => softmax(z),
        }
    }

    /// Local gradient factor dA/dZ, evaluated from the post-activation
    /// output `a` that the layer cached during its forward pass.
    ///
    /// For `Softmax` this is all ones. The true derivative is a full Jacobian,
    /// but `CrossEntropyLoss::derivative()` already returns the gradient with
    /// respect to the softmax input (`predicted - expected`), so the backward
    /// pass must pass it through unchanged. Pairing Softmax with any other loss
    /// yields an incorrect gradient.
    pub fn derivative(&self, a: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Sigmoid => a.map(|y| y * (1.0 - y)),
            ActivationFunction::ReLU => a.map(|y| if y > 0.0 { 1.0 } else { 0.0 }),
            ActivationFunction::Softmax => Matrix::filled(a.rows, a.cols, 1.0),
        }
    }

    /// Half-width of the uniform weight-initialization interval for a layer
    /// with this activation: Glorot for Sigmoid/Softmax, He-style for ReLU.
    pub fn init_limit(&self, input_size: usize, output_size: usize) -> f64 {
        match self {
            ActivationFunction::Sigmoid | ActivationFunction::Softmax => {
                (6.0 / (input_size + output_size) as f64).sqrt()
            }
            ActivationFunction::ReLU => (2.0 / input_size as f64).sqrt(),
        }
    }

    /// Ordinal written to weight files.
    pub fn tag(&self) -> i32 {
        match self {
            ActivationFunction::Sigmoid => 0,
            ActivationFunction::ReLU => 1,
            ActivationFunction::Softmax => 2,
        }
    }

    pub fn from_tag(tag: i32) -> Option<ActivationFunction> {
        match tag {
            0 => Some(ActivationFunction::Sigmoid),
            1 => Some(ActivationFunction::ReLU),
            2 => Some(ActivationFunction::Softmax),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::Softmax => "softmax",
        }
    }
}

impl FromStr for ActivationFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "relu" => Ok(ActivationFunction::ReLU),
            "softmax" => Ok(ActivationFunction::Softmax),
            _ => Err(Error::UnknownActivation(s.to_string())),
        }
    }
}

impl fmt::Display for ActivationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column-wise softmax; each column's max is subtracted before
/// exponentiating.
fn softmax(z: &Matrix) -> Matrix {
    let mut out = Matrix::zeros(z.rows, z.cols);
    for c in 0..z.cols {
        let max = (0..z.rows).map(|r| z.get(r, c)).fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for r in 0..z.rows {
            let e = (z.get(r, c) - max).exp();
            out.set(r, c, e);
            sum += e;
        }
        for r in 0..z.rows {
            out.set(r, c, out.get(r, c) / sum);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Matrix {
        Matrix::from_rows(&[
            vec![-3.0, 0.0, 2.5, 700.0],
            vec![1.0, 0.0, -2.5, 699.0],
            vec![0.5, 0.0, 10.0, -700.0],
        ])
        .unwrap()
    }

    #[test]
    fn softmax_columns_are_distributions() {
        let a = ActivationFunction::Softmax.activate(&batch());
        for c in 0..a.cols {
            let sum: f64 = a.col_values(c).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "column {c} sums to {sum}");
        }
        // Large logits stay finite thanks to the max shift.
        assert!(a.iter().all(|x| x.is_finite()));
        assert!((a.get(0, 1) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn softmax_entries_are_strictly_between_zero_and_one() {
        let z = Matrix::from_rows(&[vec![0.3, -1.0], vec![2.0, 4.0], vec![-0.7, 1.5]]).unwrap();
        let a = ActivationFunction::Softmax.activate(&z);
        assert!(a.iter().all(|&x| x > 0.0 && x < 1.0));
    }

    #[test]
    fn sigmoid_is_bounded() {
        let z = Matrix::from_rows(&[vec![-30.0, -1.0, 0.0, 1.0, 30.0]]).unwrap();
        let a = ActivationFunction::Sigmoid.activate(&z);
        assert!(a.iter().all(|&x| x > 0.0 && x < 1.0));
        assert!((a.get(0, 2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn relu_keeps_positive_values_only() {
        let z = batch();
        let a = ActivationFunction::ReLU.activate(&z);
        for r in 0..z.rows {
            for c in 0..z.cols {
                let expected = if z.get(r, c) > 0.0 { z.get(r, c) } else { 0.0 };
                assert_eq!(a.get(r, c), expected);
            }
        }
    }

    #[test]
    fn derivatives_use_post_activation_values() {
        let a = Matrix::from_rows(&[vec![0.5, 0.0, 2.0]]).unwrap();
        let sig = ActivationFunction::Sigmoid.derivative(&a);
        assert!((sig.get(0, 0) - 0.25).abs() < 1e-12);

        let relu = ActivationFunction::ReLU.derivative(&a);
        assert_eq!(relu.as_slice(), &[1.0, 0.0, 1.0]);

        let soft = ActivationFunction::Softmax.derivative(&a);
        assert_eq!(soft.as_slice(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn names_and_tags_parse_back() {
        for act in [ActivationFunction::Sigmoid, ActivationFunction::ReLU, ActivationFunction::Softmax] {
            assert_eq!(act.name().parse::<ActivationFunction>().unwrap(), act);
            assert_eq!(ActivationFunction::from_tag(act.tag()), Some(act));
        }
        assert_eq!("ReLU".parse::<ActivationFunction>().unwrap(), ActivationFunction::ReLU);
        assert!(matches!("tanh".parse::<ActivationFunction>(), Err(Error::UnknownActivation(_))));
        assert_eq!(ActivationFunction::from_tag(3), None);
    }

    #[test]
    fn init_limits_follow_fan_sizes() {
        assert!((ActivationFunction::Sigmoid.init_limit(4, 2) - 1.0).abs() < 1e-12);
        assert!((ActivationFunction::ReLU.init_limit(8, 100) - 0.5).abs() < 1e-12);
    }
}
