pub mod csv;

pub use csv::{load_csv, parse_csv_matrix};
