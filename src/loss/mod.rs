pub mod mse;
pub mod cross_entropy;
pub mod loss_type;

pub use mse::MseLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use loss_type::LossType;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

fn check_shapes(context: &'static str, predicted: &Matrix, expected: &Matrix) -> Result<()> {
    if predicted.shape() != expected.shape() {
        return Err(Error::ShapeMismatch {
            context,
            expected: predicted.shape(),
            actual: expected.shape(),
        });
    }
    if predicted.cols == 0 {
        return Err(Error::InvalidInput(format!("{context}: batch has no samples")));
    }
    Ok(())
}
