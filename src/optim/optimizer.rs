use crate::error::Result;
use crate::math::matrix::Matrix;

/// Update rule applied to one layer's parameters given their gradients.
///
/// Layers and the network only see this trait, so a stateful rule can be
/// added without touching either.
pub trait Optimizer {
    fn update(
        &self,
        weights: &mut Matrix,
        biases: &mut Matrix,
        weights_grad: &Matrix,
        biases_grad: &Matrix,
    ) -> Result<()>;
}
