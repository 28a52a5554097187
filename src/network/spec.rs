use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};

/// Architecture and hyperparameters for one training run.
///
/// Fields:
/// - `layer_sizes`  : widths from the input layer to the output layer
///                     (at least two entries, all positive)
/// - `activations`  : activation names, one per weight layer, i.e.
///                     `layer_sizes.len() - 1` entries
/// - `epochs`       : number of passes over the training data
/// - `learning_rate`: SGD step size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub layer_sizes: Vec<usize>,
    pub activations: Vec<String>,
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            layer_sizes: vec![784, 128, 10],
            activations: vec!["sigmoid".into(), "sigmoid".into()],
            epochs: 10,
            learning_rate: 0.01,
        }
    }
}

impl NetworkConfig {
    /// Checks every field and returns the parsed activation functions.
    pub fn validate(&self) -> Result<Vec<ActivationFunction>> {
        if self.layer_sizes.len() < 2 {
            return Err(Error::InvalidConfig(format!(
                "need at least an input and an output size, got {:?}",
                self.layer_sizes
            )));
        }
        if let Some(pos) = self.layer_sizes.iter().position(|&s| s == 0) {
            return Err(Error::InvalidConfig(format!("layer size at position {pos} must be positive")));
        }
        if self.activations.len() != self.layer_sizes.len() - 1 {
            return Err(Error::InvalidConfig(format!(
                "number of activations ({}) must be one less than number of layer sizes ({})",
                self.activations.len(),
                self.layer_sizes.len()
            )));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be positive".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }
        self.activation_functions()
    }

    pub fn activation_functions(&self) -> Result<Vec<ActivationFunction>> {
        self.activations.iter().map(|name| name.parse()).collect()
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| Error::io(path, std::io::Error::new(std::io::ErrorKind::Other, e)))
    }

    /// Deserializes a config from a JSON file. Missing fields take their
    /// default values; the result is not validated.
    pub fn load_json(path: impl AsRef<Path>) -> Result<NetworkConfig> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))
    }
}

/// Parses a comma-separated list of positive layer widths, e.g. `"784,128,10"`.
pub fn parse_layer_sizes(sizes: &str) -> Result<Vec<usize>> {
    sizes
        .split(',')
        .map(|part| match part.trim().parse::<usize>() {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(Error::InvalidConfig(format!("invalid layer size value: {part:?}"))),
        })
        .collect()
}

/// Parses a comma-separated list of activation names, e.g. `"relu,softmax"`.
/// Names are only checked for emptiness here; `NetworkConfig::validate`
/// resolves them.
pub fn parse_activations(names: &str) -> Result<Vec<String>> {
    names
        .split(',')
        .map(|part| {
            let name = part.trim();
            if name.is_empty() {
                Err(Error::InvalidConfig("activation function names cannot be empty".into()))
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sizes: &[usize], acts: &[&str]) -> NetworkConfig {
        NetworkConfig {
            layer_sizes: sizes.to_vec(),
            activations: acts.iter().map(|s| s.to_string()).collect(),
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        let acts = NetworkConfig::default().validate().unwrap();
        assert_eq!(acts, vec![ActivationFunction::Sigmoid, ActivationFunction::Sigmoid]);
    }

    #[test]
    fn activation_count_must_match_layer_count() {
        let err = config(&[4, 8, 2], &["relu"]).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn unknown_activation_is_rejected() {
        let err = config(&[4, 2], &["tanh"]).validate().unwrap_err();
        assert!(matches!(err, Error::UnknownActivation(_)));
    }

    #[test]
    fn bad_hyperparameters_are_rejected() {
        assert!(config(&[4], &[]).validate().is_err());
        assert!(config(&[4, 0], &["relu"]).validate().is_err());

        let mut c = config(&[4, 2], &["softmax"]);
        c.epochs = 0;
        assert!(c.validate().is_err());

        let mut c = config(&[4, 2], &["softmax"]);
        c.learning_rate = -1.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn parses_comma_separated_lists() {
        assert_eq!(parse_layer_sizes("784, 128,10").unwrap(), vec![784, 128, 10]);
        assert!(parse_layer_sizes("784,0,10").is_err());
        assert!(parse_layer_sizes("784,x").is_err());

        assert_eq!(parse_activations("relu,softmax").unwrap(), vec!["relu", "softmax"]);
        assert!(parse_activations("relu,,softmax").is_err());
    }

    #[test]
    fn json_fields_fall_back_to_defaults() {
        let c: NetworkConfig = serde_json::from_str(r#"{"epochs": 3}"#).unwrap();
        assert_eq!(c.epochs, 3);
        assert_eq!(c.layer_sizes, vec![784, 128, 10]);
    }
}
