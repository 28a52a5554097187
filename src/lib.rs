pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod data;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use network::spec::NetworkConfig;
pub use loss::{CrossEntropyLoss, LossType, MseLoss};
pub use optim::{Optimizer, Sgd};
pub use train::{train_loop, EpochStats, TrainConfig, TrainReport, BATCH_SIZE};
pub use data::load_csv;
pub use error::{Error, ErrorCategory, Result};
