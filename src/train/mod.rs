pub mod epoch_stats;
pub mod train_config;
pub mod loop_fn;

pub use epoch_stats::{EpochStats, TrainReport};
pub use train_config::{TrainConfig, BATCH_SIZE, LOG_INTERVAL};
pub use loop_fn::train_loop;
