use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    activation::activation::ActivationFunction,
    error::{Error, Result},
    layers::dense::Layer,
    loss::loss_type::LossType,
    math::matrix::Matrix,
    network::{spec::NetworkConfig, weights_file},
    optim::sgd::Sgd,
    train::{loop_fn::train_loop, train_config::TrainConfig, TrainReport},
};

/// Learning rate of the optimizer a fresh network starts with.
const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// A stack of dense layers plus the optimizer that updates them.
///
/// Layer `k`'s output width always equals layer `k + 1`'s input width.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    optimizer: Sgd,
}

impl Network {
    /// Builds a network with freshly initialized weights from layer widths
    /// (input first) and one activation per weight layer.
    pub fn new(layer_sizes: &[usize], activations: &[ActivationFunction]) -> Result<Network> {
        Network::with_rng(layer_sizes, activations, &mut StdRng::from_entropy())
    }

    /// Like `new`, drawing initial weights from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[ActivationFunction],
        rng: &mut R,
    ) -> Result<Network> {
        if layer_sizes.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "need at least an input and an output size, got {layer_sizes:?}"
            )));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(Error::InvalidConfig(format!(
                "number of activations ({}) must be one less than number of layer sizes ({})",
                activations.len(),
                layer_sizes.len()
            )));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations)
            .map(|(pair, &activation)| Layer::new(pair[0], pair[1], activation, &mut *rng))
            .collect::<Result<Vec<_>>>()?;

        debug!("built network {layer_sizes:?} with activations {activations:?}");
        Network::from_layers(layers)
    }

    /// Builds a network from a validated `NetworkConfig`.
    pub fn from_config<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Network> {
        let activations = config.validate()?;
        Network::with_rng(&config.layer_sizes, &activations, rng)
    }

    /// Wraps existing layers, rejecting mismatched adjacent widths.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig("a network needs at least one layer".into()));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(Error::LayerWidthMismatch {
                    layer: i + 1,
                    expected: pair[1].input_size(),
                    actual: pair[0].output_size(),
                });
            }
        }
        let optimizer = Sgd::new(DEFAULT_LEARNING_RATE)?;
        Ok(Network { layers, optimizer })
    }

    /// Reads a network from a weights file written by `save_weights`.
    pub fn load(path: impl AsRef<Path>) -> Result<Network> {
        let layers = read_weights_file(path.as_ref())?;
        Network::from_layers(layers)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Current optimizer learning rate; replaced by every `backward` call.
    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    /// Forward pass; each layer caches its input and output for `backward`.
    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let mut current = self.layers[0].forward(input)?;
        for layer in &mut self.layers[1..] {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    /// Inference-only forward pass; leaves layer caches untouched.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        let mut current = self.layers[0].infer(input)?;
        for layer in &self.layers[1..] {
            current = layer.infer(&current)?;
        }
        Ok(current)
    }

    /// Backpropagates `d_output` (dL/dY for the batch of the last `forward`)
    /// through every layer in reverse, updating parameters with a fresh
    /// `Sgd` at `learning_rate`.
    ///
    /// Fails before touching any parameter if some layer has no pending
    /// forward pass.
    pub fn backward(&mut self, learning_rate: f64, d_output: &Matrix) -> Result<()> {
        self.optimizer = Sgd::new(learning_rate)?;

        if let Some(layer) = self.layers.iter().position(|l| !l.has_forward_cache()) {
            return Err(Error::MissingForwardPass { layer });
        }

        let mut grad = d_output.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad, &self.optimizer)?;
        }
        Ok(())
    }

    /// Trains for `epochs` epochs of fixed-size mini-batches with a fresh
    /// entropy-seeded shuffle source.
    pub fn train(
        &mut self,
        inputs: &Matrix,
        labels: &Matrix,
        epochs: usize,
        learning_rate: f64,
        loss_type: LossType,
    ) -> Result<TrainReport> {
        let config = TrainConfig::new(epochs, learning_rate, loss_type);
        self.train_with_rng(inputs, labels, &config, &mut StdRng::from_entropy())
    }

    /// Like `train`, shuffling with `rng`.
    pub fn train_with_rng<R: Rng + ?Sized>(
        &mut self,
        inputs: &Matrix,
        labels: &Matrix,
        config: &TrainConfig,
        rng: &mut R,
    ) -> Result<TrainReport> {
        if config.loss_type != LossType::CrossEntropy
            && self.layers.iter().any(|l| l.activation() == ActivationFunction::Softmax)
        {
            warn!("softmax layers only receive a correct gradient from cross-entropy loss");
        }
        train_loop(self, inputs, labels, config, rng)
    }

    /// Fraction of samples whose predicted argmax matches the label argmax.
    pub fn accuracy(&self, inputs: &Matrix, labels: &Matrix) -> Result<f64> {
        check_dataset(inputs, labels, "accuracy")?;
        let predicted = self.predict(inputs)?;
        check_label_shape(&predicted, labels)?;

        let correct = (0..predicted.cols)
            .filter(|&c| predicted.argmax_column(c) == labels.argmax_column(c))
            .count();
        Ok(correct as f64 / predicted.cols as f64)
    }

    /// Loss over the whole dataset in one batch, without updating anything.
    pub fn evaluate_loss(&self, inputs: &Matrix, labels: &Matrix, loss_type: LossType) -> Result<f64> {
        check_dataset(inputs, labels, "evaluation")?;
        let predicted = self.predict(inputs)?;
        loss_type.loss(&predicted, labels)
    }

    /// Writes all layers to `path` in the binary weights format.
    pub fn save_weights(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        weights_file::write_layers(&self.layers, &mut writer).map_err(|e| Error::io(path, e))?;
        debug!("saved {} layers to {}", self.layers.len(), path.display());
        Ok(())
    }

    /// Replaces every layer with the ones stored at `path`. Dimensions and
    /// activations come from the file. On any error the current layers are
    /// left as they were.
    pub fn load_weights(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let layers = read_weights_file(path.as_ref())?;
        self.layers = layers;
        Ok(())
    }
}

fn read_weights_file(path: &Path) -> Result<Vec<Layer>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let layers = weights_file::read_layers(&mut BufReader::new(file), path)?;
    debug!("loaded {} layers from {}", layers.len(), path.display());
    Ok(layers)
}

/// Non-empty inputs and labels with one label column per sample.
pub(crate) fn check_dataset(inputs: &Matrix, labels: &Matrix, context: &str) -> Result<()> {
    if inputs.cols == 0 || labels.cols == 0 {
        return Err(Error::InvalidInput(format!("empty data provided for {context}")));
    }
    if inputs.cols != labels.cols {
        return Err(Error::InvalidInput(format!(
            "{context}: {} input samples but {} label samples",
            inputs.cols, labels.cols
        )));
    }
    Ok(())
}

fn check_label_shape(predicted: &Matrix, labels: &Matrix) -> Result<()> {
    if predicted.shape() != labels.shape() {
        return Err(Error::ShapeMismatch {
            context: "labels",
            expected: predicted.shape(),
            actual: labels.shape(),
        });
    }
    Ok(())
}
