//! Binary weights format.
//!
//! All values are little-endian:
//!
//! ```text
//! i32                 layer_count
//! per layer:
//!   i32               rows (output width)
//!   i32               cols (input width)
//!   f64[rows * cols]  weights, row-major
//!   i32               bias_length (== rows)
//!   f64[bias_length]  biases
//!   i32               activation tag (0 = sigmoid, 1 = relu, 2 = softmax)
//! ```
//!
//! Files that stored the weight buffer column-major (as Eigen's default
//! storage does) are not compatible and will load as transposed garbage or
//! fail validation.

use std::io::{self, Read, Write};
use std::path::Path;

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;

/// Writes `layers` in the binary weights format.
pub fn write_layers<W: Write>(layers: &[Layer], writer: &mut W) -> io::Result<()> {
    write_i32(writer, checked_i32(layers.len())?)?;
    for layer in layers {
        let weights = layer.weights();
        write_i32(writer, checked_i32(weights.rows)?)?;
        write_i32(writer, checked_i32(weights.cols)?)?;
        for &w in weights.iter() {
            writer.write_all(&w.to_le_bytes())?;
        }

        let biases = layer.biases();
        write_i32(writer, checked_i32(biases.len())?)?;
        for &b in biases.iter() {
            writer.write_all(&b.to_le_bytes())?;
        }

        write_i32(writer, layer.activation().tag())?;
    }
    writer.flush()
}

/// Reads a complete layer sequence. `source` only names the input in errors.
///
/// Nothing is returned unless every record decodes and validates, so a
/// caller can swap the result in without ever holding a partial model.
pub fn read_layers<R: Read>(reader: &mut R, source: &Path) -> Result<Vec<Layer>> {
    let mut input = FieldReader { reader, source };

    let layer_count = input.read_i32("layer count")?;
    if layer_count <= 0 {
        return Err(Error::CorruptWeights(format!(
            "invalid number of layers: {layer_count}"
        )));
    }

    let mut layers = Vec::with_capacity((layer_count as usize).min(1024));
    for index in 0..layer_count as usize {
        let rows = input.read_i32("row count")?;
        let cols = input.read_i32("column count")?;
        if rows <= 0 || cols <= 0 {
            return Err(Error::CorruptWeights(format!(
                "layer {index} has invalid dimensions {rows}x{cols}"
            )));
        }
        let (rows, cols) = (rows as usize, cols as usize);
        let weights = Matrix::from_vec(rows, cols, input.read_f64s(rows * cols, "weights")?)?;

        let bias_len = input.read_i32("bias length")?;
        if bias_len <= 0 {
            return Err(Error::CorruptWeights(format!(
                "layer {index} has invalid bias length {bias_len}"
            )));
        }
        let bias_len = bias_len as usize;
        if bias_len != rows {
            return Err(Error::CorruptWeights(format!(
                "layer {index} has {bias_len} biases for {rows} outputs"
            )));
        }
        let biases = Matrix::column(input.read_f64s(bias_len, "biases")?);

        let tag = input.read_i32("activation tag")?;
        let activation = ActivationFunction::from_tag(tag).ok_or_else(|| {
            Error::CorruptWeights(format!("layer {index} has unknown activation tag {tag}"))
        })?;

        if let Some(prev) = layers.last().map(Layer::output_size) {
            if prev != cols {
                return Err(Error::CorruptWeights(format!(
                    "layer {index} expects {cols} inputs but layer {} produces {prev}",
                    index - 1
                )));
            }
        }

        layers.push(Layer::from_parts(weights, biases, activation)?);
    }

    Ok(layers)
}

struct FieldReader<'a, R> {
    reader: &'a mut R,
    source: &'a Path,
}

impl<R: Read> FieldReader<'_, R> {
    fn read_exact(&mut self, buf: &mut [u8], field: &str) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::CorruptWeights(format!("file ends while reading {field}"))
            } else {
                Error::io(self.source, e)
            }
        })
    }

    fn read_i32(&mut self, field: &str) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, field)?;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_f64s(&mut self, count: usize, field: &str) -> Result<Vec<f64>> {
        // Capacity is capped so a bogus header cannot force a huge allocation
        // before the file runs out.
        let mut values = Vec::with_capacity(count.min(1 << 16));
        let mut buf = [0u8; 8];
        for _ in 0..count {
            self.read_exact(&mut buf, field)?;
            values.push(f64::from_le_bytes(buf));
        }
        Ok(values)
    }
}

fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

fn checked_i32(value: usize) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("{value} does not fit in an i32 field"))
    })
}
