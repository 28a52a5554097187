use rand::Rng;

use crate::error::{Error, Result};

/// Dense `f64` matrix stored row-major.
///
/// Batches are laid out one sample per column: `F` features over `N` samples
/// form an `F x N` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix { rows, cols, data: vec![value; rows * cols] }
    }

    /// Samples every entry independently from `U[-limit, limit]`.
    pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, limit: f64, rng: &mut R) -> Matrix {
        let data = (0..rows * cols).map(|_| rng.gen_range(-limit..=limit)).collect();
        Matrix { rows, cols, data }
    }

    /// Wraps a row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Matrix> {
        if data.len() != rows * cols {
            return Err(Error::InvalidInput(format!(
                "buffer of {} values cannot form a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Matrix> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidInput(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix { rows: rows.len(), cols, data })
    }

    /// Single-column matrix.
    pub fn column(values: Vec<f64>) -> Matrix {
        Matrix { rows: values.len(), cols: 1, data: values }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    pub fn col_values(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Matrix product `self @ rhs`.
    pub fn dot(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(Error::ShapeMismatch {
                context: "matrix product",
                expected: (self.cols, rhs.cols),
                actual: rhs.shape(),
            });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            let out_row = &mut res.data[i * rhs.cols..(i + 1) * rhs.cols];
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                let rhs_row = &rhs.data[k * rhs.cols..(k + 1) * rhs.cols];
                for (o, &b) in out_row.iter_mut().zip(rhs_row) {
                    *o += a * b;
                }
            }
        }
        Ok(res)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "elementwise subtract", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "hadamard product", |a, b| a * b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// In-place `self -= factor * rhs`.
    pub fn sub_scaled_assign(&mut self, rhs: &Matrix, factor: f64) -> Result<()> {
        self.check_same_shape(rhs, "scaled update")?;
        for (a, &b) in self.data.iter_mut().zip(&rhs.data) {
            *a -= factor * b;
        }
        Ok(())
    }

    /// Adds the column vector `bias` (`rows x 1`) to every column.
    pub fn add_column_broadcast(&self, bias: &Matrix) -> Result<Matrix> {
        if bias.cols != 1 || bias.rows != self.rows {
            return Err(Error::ShapeMismatch {
                context: "bias broadcast",
                expected: (self.rows, 1),
                actual: bias.shape(),
            });
        }
        let mut res = self.clone();
        for (r, row) in res.data.chunks_mut(self.cols.max(1)).enumerate().take(self.rows) {
            let b = bias.data[r];
            row.iter_mut().for_each(|x| *x += b);
        }
        Ok(res)
    }

    /// Sums each row, producing a `rows x 1` column.
    pub fn row_sums(&self) -> Matrix {
        let data = (0..self.rows)
            .map(|r| self.data[r * self.cols..(r + 1) * self.cols].iter().sum())
            .collect();
        Matrix { rows: self.rows, cols: 1, data }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.sum() / self.data.len() as f64
    }

    /// Gathers the given columns, in order, into a new matrix.
    pub fn select_columns(&self, indices: &[usize]) -> Matrix {
        let mut res = Matrix::zeros(self.rows, indices.len());
        for r in 0..self.rows {
            for (j, &c) in indices.iter().enumerate() {
                res.data[r * indices.len() + j] = self.data[r * self.cols + c];
            }
        }
        res
    }

    /// Columns `start..start + count`.
    pub fn column_slice(&self, start: usize, count: usize) -> Matrix {
        let mut res = Matrix::zeros(self.rows, count);
        for r in 0..self.rows {
            let src = &self.data[r * self.cols + start..r * self.cols + start + count];
            res.data[r * count..(r + 1) * count].copy_from_slice(src);
        }
        res
    }

    /// Row index of the largest value in column `col`. Ties resolve to the
    /// first occurrence.
    pub fn argmax_column(&self, col: usize) -> usize {
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;
        for r in 0..self.rows {
            let v = self.get(r, col);
            if v > best_value {
                best_value = v;
                best = r;
            }
        }
        best
    }

    fn check_same_shape(&self, rhs: &Matrix, context: &'static str) -> Result<()> {
        if self.shape() != rhs.shape() {
            return Err(Error::ShapeMismatch {
                context,
                expected: self.shape(),
                actual: rhs.shape(),
            });
        }
        Ok(())
    }

    fn zip_with<F>(&self, rhs: &Matrix, context: &'static str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(rhs, context)?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(&a, &b)| f(a, b)).collect(),
        })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn dot_multiplies_row_by_column() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        let b = m(&[&[1.0, 0.0, 2.0], &[0.0, 1.0, 1.0]]);
        let c = a.dot(&b).unwrap();
        assert_eq!(c, m(&[&[1.0, 2.0, 4.0], &[3.0, 4.0, 10.0], &[5.0, 6.0, 16.0]]));
    }

    #[test]
    fn dot_rejects_inner_dimension_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        assert!(matches!(a.dot(&b), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn transpose_swaps_axes() {
        let a = m(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let t = a.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t, m(&[&[1.0, 4.0], &[2.0, 5.0], &[3.0, 6.0]]));
    }

    #[test]
    fn bias_is_added_to_every_column() {
        let a = Matrix::zeros(2, 3);
        let bias = Matrix::column(vec![1.0, -1.0]);
        let out = a.add_column_broadcast(&bias).unwrap();
        assert_eq!(out, m(&[&[1.0, 1.0, 1.0], &[-1.0, -1.0, -1.0]]));
        assert!(a.add_column_broadcast(&Matrix::column(vec![1.0])).is_err());
    }

    #[test]
    fn row_sums_and_argmax() {
        let a = m(&[&[1.0, 5.0], &[3.0, 2.0]]);
        assert_eq!(a.row_sums(), Matrix::column(vec![6.0, 5.0]));
        assert_eq!(a.argmax_column(0), 1);
        assert_eq!(a.argmax_column(1), 0);
    }

    #[test]
    fn column_selection_and_slices() {
        let a = m(&[&[0.0, 1.0, 2.0, 3.0], &[10.0, 11.0, 12.0, 13.0]]);
        assert_eq!(a.select_columns(&[3, 0]), m(&[&[3.0, 0.0], &[13.0, 10.0]]));
        assert_eq!(a.column_slice(1, 2), m(&[&[1.0, 2.0], &[11.0, 12.0]]));
    }

    #[test]
    fn uniform_respects_limit_and_seed() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Matrix::uniform(4, 5, 0.5, &mut rng);
        assert!(a.iter().all(|x| x.abs() <= 0.5));

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(a, Matrix::uniform(4, 5, 0.5, &mut rng));
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Matrix::from_vec(2, 2, vec![1.0; 3]).is_err());
        assert!(Matrix::from_vec(2, 2, vec![1.0; 4]).is_ok());
    }
}
