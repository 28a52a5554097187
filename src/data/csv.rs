//! CSV matrix loading for the training and prediction drivers.
//!
//! Supported format:
//! - UTF-8, comma-separated, no header row, no quoting
//! - Each line is one matrix row; the first `cols` cells are used and any
//!   further cells are ignored
//! - Lines after the first `rows` are ignored
//!
//! Feature files are laid out one feature per line and one sample per
//! column, matching the `features x samples` matrices the network consumes.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Loads a `rows x cols` matrix from the CSV file at `path`.
pub fn load_csv(path: impl AsRef<Path>, rows: usize, cols: usize) -> Result<Matrix> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    parse_csv_matrix(BufReader::new(file), rows, cols, &path.display().to_string())
}

/// Parses a `rows x cols` matrix from CSV text. `name` is only used in error
/// messages.
pub fn parse_csv_matrix<R: BufRead>(reader: R, rows: usize, cols: usize, name: &str) -> Result<Matrix> {
    let mut data = Vec::with_capacity(rows * cols);
    let mut row = 0;

    for line in reader.lines() {
        if row == rows {
            break;
        }
        let line = line.map_err(|e| Error::io(name, e))?;

        let mut col = 0;
        for cell in line.split(',').take(cols) {
            let value = cell.trim().parse::<f64>().map_err(|_| {
                Error::InvalidInput(format!(
                    "non-numeric value {cell:?} in {name} at row {row}, column {col}"
                ))
            })?;
            data.push(value);
            col += 1;
        }
        if col < cols {
            return Err(Error::InvalidInput(format!(
                "not enough columns in {name} at row {row}: expected {cols}, got {col}"
            )));
        }
        row += 1;
    }

    if row < rows {
        return Err(Error::InvalidInput(format!(
            "not enough rows in {name}: expected {rows}, got {row}"
        )));
    }

    Matrix::from_vec(rows, cols, data)
}
