pub mod network;
pub mod spec;
pub mod weights_file;

pub use network::Network;
pub use spec::{parse_activations, parse_layer_sizes, NetworkConfig};
