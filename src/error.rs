use std::path::PathBuf;

/// Broad failure classes, so a driver can pick an exit path without matching
/// every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidConfig,
    InvalidInput,
    CorruptWeights,
    ResourceUnavailable,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown activation function: {0:?}")]
    UnknownActivation(String),

    #[error("unknown loss function: {0:?}")]
    UnknownLoss(String),

    /// Layer `layer` expects `expected` inputs but the previous layer produces `actual`.
    #[error("layer {layer} expects {expected} inputs but receives {actual}")]
    LayerWidthMismatch {
        layer: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{context}: expected shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("layer {layer} has no cached forward pass to backpropagate through")]
    MissingForwardPass { layer: usize },

    #[error("corrupt weights file: {0}")]
    CorruptWeights(String),

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig(_)
            | Error::UnknownActivation(_)
            | Error::UnknownLoss(_)
            | Error::LayerWidthMismatch { .. } => ErrorCategory::InvalidConfig,
            Error::InvalidInput(_)
            | Error::ShapeMismatch { .. }
            | Error::MissingForwardPass { .. } => ErrorCategory::InvalidInput,
            Error::CorruptWeights(_) => ErrorCategory::CorruptWeights,
            Error::Io { .. } => ErrorCategory::ResourceUnavailable,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
