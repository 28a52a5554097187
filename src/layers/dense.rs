use rand::Rng;

use crate::{
    activation::activation::ActivationFunction,
    error::{Error, Result},
    math::matrix::Matrix,
    optim::optimizer::Optimizer,
};

/// Input and output of the most recent `forward` call, kept for the paired
/// `backward` call. `backward` consumes it, so each forward pass can be
/// backpropagated at most once.
#[derive(Debug, Clone)]
struct ForwardCache {
    input: Matrix,
    output: Matrix,
}

/// One affine transform followed by an activation: `A = f(W @ X + b)`.
#[derive(Debug, Clone)]
pub struct Layer {
    /// `output_size x input_size`.
    weights: Matrix,
    /// `output_size x 1`, broadcast over the batch.
    biases: Matrix,
    activation: ActivationFunction,
    cache: Option<ForwardCache>,
}

impl Layer {
    /// Builds a layer with uniform weights in `[-limit, limit]` (see
    /// `ActivationFunction::init_limit`) and zero biases.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Result<Layer> {
        if input_size == 0 || output_size == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer sizes must be positive, got {input_size} -> {output_size}"
            )));
        }
        let limit = activation.init_limit(input_size, output_size);
        Ok(Layer {
            weights: Matrix::uniform(output_size, input_size, limit, rng),
            biases: Matrix::zeros(output_size, 1),
            activation,
            cache: None,
        })
    }

    /// Builds a layer from existing parameters, e.g. ones read from a weights file.
    pub fn from_parts(weights: Matrix, biases: Matrix, activation: ActivationFunction) -> Result<Layer> {
        if weights.rows == 0 || weights.cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "weight matrix must be non-empty, got {:?}",
                weights.shape()
            )));
        }
        if biases.shape() != (weights.rows, 1) {
            return Err(Error::ShapeMismatch {
                context: "layer biases",
                expected: (weights.rows, 1),
                actual: biases.shape(),
            });
        }
        Ok(Layer { weights, biases, activation, cache: None })
    }

    pub fn input_size(&self) -> usize {
        self.weights.cols
    }

    pub fn output_size(&self) -> usize {
        self.weights.rows
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Whether a forward pass is waiting to be backpropagated.
    pub fn has_forward_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Forward pass over a batch (one sample per column). Stores a copy of the
    /// input and the activated output for the next `backward` call,
    /// replacing any earlier cache.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let output = self.infer(input)?;
        self.cache = Some(ForwardCache {
            input: input.clone(),
            output: output.clone(),
        });
        Ok(output)
    }

    /// Forward pass without touching the cache.
    pub fn infer(&self, input: &Matrix) -> Result<Matrix> {
        if input.rows != self.input_size() {
            return Err(Error::ShapeMismatch {
                context: "layer input",
                expected: (self.input_size(), input.cols),
                actual: input.shape(),
            });
        }
        let z = self.weights.dot(input)?.add_column_broadcast(&self.biases)?;
        Ok(self.activation.activate(&z))
    }

    /// Backward pass for the cached batch.
    ///
    /// `upstream` is dL/dA for this layer's output. Computes
    /// `dZ = upstream * f'(A)`, `dW = dZ @ X^T`, `db = rowsum(dZ)`, hands the
    /// gradients to `optimizer`, and returns `dX = W^T @ dZ` taken with the
    /// freshly updated weights.
    pub fn backward(&mut self, upstream: &Matrix, optimizer: &dyn Optimizer) -> Result<Matrix> {
        let cache = match self.cache.as_ref() {
            Some(cache) => cache,
            None => {
                return Err(Error::InvalidInput(
                    "backward called without a preceding forward pass".into(),
                ))
            }
        };
        if upstream.shape() != cache.output.shape() {
            return Err(Error::ShapeMismatch {
                context: "upstream gradient",
                expected: cache.output.shape(),
                actual: upstream.shape(),
            });
        }

        let d_z = upstream.hadamard(&self.activation.derivative(&cache.output))?;
        let weights_grad = d_z.dot(&cache.input.transpose())?;
        let biases_grad = d_z.row_sums();

        optimizer.update(&mut self.weights, &mut self.biases, &weights_grad, &biases_grad)?;
        let d_input = self.weights.transpose().dot(&d_z)?;
        self.cache = None;

        Ok(d_input)
    }
}
