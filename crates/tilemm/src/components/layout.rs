use core::marker::PhantomData;

use tilemm_runtime::{
    CubeElement,
    client::ComputeClient,
    server::{ComputeServer, Handle, IoError},
};

use super::MatmulInvalidProblem;

/// Dense row-major matrix in host memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<E> {
    rows: usize,
    cols: usize,
    storage: Vec<E>,
}

impl<E: CubeElement> Matrix<E> {
    /// Wrap a row-major storage, which must hold exactly `rows × cols` elements.
    pub fn new(rows: usize, cols: usize, storage: Vec<E>) -> Result<Self, MatmulInvalidProblem> {
        if storage.len() != rows * cols {
            return Err(MatmulInvalidProblem::StorageSize {
                rows,
                cols,
                len: storage.len(),
            });
        }

        Ok(Self {
            rows,
            cols,
            storage,
        })
    }

    pub fn filled(rows: usize, cols: usize, value: E) -> Self {
        Self {
            rows,
            cols,
            storage: vec![value; rows * cols],
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, E::zero())
    }

    /// Build a matrix from the value of each `(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut func: impl FnMut(usize, usize) -> E) -> Self {
        let storage = (0..rows * cols)
            .map(|index| func(index / cols, index % cols))
            .collect();

        Self {
            rows,
            cols,
            storage,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Element at `(row, col)`, none when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<E> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.storage[row * self.cols + col])
    }

    pub fn as_slice(&self) -> &[E] {
        &self.storage
    }

    pub fn into_vec(self) -> Vec<E> {
        self.storage
    }
}

/// Dense row-major matrix stored on a device.
///
/// Cloning a handle doesn't copy the data, both handles point to the same allocation.
#[derive(Debug)]
pub struct MatrixHandle<E> {
    pub handle: Handle,
    pub rows: usize,
    pub cols: usize,
    _elem: PhantomData<E>,
}

impl<E> Clone for MatrixHandle<E> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            rows: self.rows,
            cols: self.cols,
            _elem: PhantomData,
        }
    }
}

impl<E: CubeElement> MatrixHandle<E> {
    /// Copy a host matrix to the device.
    pub fn from_host<S: ComputeServer>(
        client: &ComputeClient<S>,
        matrix: &Matrix<E>,
    ) -> Result<Self, IoError> {
        let handle = client.create_from_slice(matrix.as_slice())?;

        Ok(Self {
            handle,
            rows: matrix.rows,
            cols: matrix.cols,
            _elem: PhantomData,
        })
    }

    /// Reserve a zeroed matrix on the device.
    pub fn empty<S: ComputeServer>(
        client: &ComputeClient<S>,
        rows: usize,
        cols: usize,
    ) -> Result<Self, IoError> {
        let handle = client.empty(rows * cols * size_of::<E>())?;

        Ok(Self {
            handle,
            rows,
            cols,
            _elem: PhantomData,
        })
    }

    /// Copy the matrix back to the host.
    pub fn to_host<S: ComputeServer>(
        &self,
        client: &ComputeClient<S>,
    ) -> Result<Matrix<E>, IoError> {
        let storage = client.read_elems::<E>(&self.handle)?;

        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            storage,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Fails when the device buffer doesn't hold exactly `rows × cols` elements.
    pub fn check_storage(&self) -> Result<(), MatmulInvalidProblem> {
        let size = self.handle.size();

        if size % size_of::<E>() != 0 || size / size_of::<E>() != self.rows * self.cols {
            return Err(MatmulInvalidProblem::StorageSize {
                rows: self.rows,
                cols: self.cols,
                len: size / size_of::<E>(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilemm_runtime::{CpuDevice, CpuRuntime, Runtime};

    #[test]
    fn storage_must_match_shape() {
        assert!(Matrix::new(2, 3, vec![0.0f32; 6]).is_ok());
        assert_eq!(
            Matrix::new(2, 3, vec![0.0f32; 5]),
            Err(MatmulInvalidProblem::StorageSize {
                rows: 2,
                cols: 3,
                len: 5
            })
        );
    }

    #[test]
    fn from_fn_is_row_major() {
        let matrix = Matrix::<f64>::from_fn(2, 3, |row, col| (row * 10 + col) as f64);

        assert_eq!(matrix.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(matrix.get(1, 2), Some(12.0));
        assert_eq!(matrix.get(2, 0), None);
    }

    #[test]
    fn device_round_trip_keeps_shape() {
        let client = CpuRuntime::client(&CpuDevice);
        let matrix = Matrix::<f32>::from_fn(3, 2, |row, col| (row + col) as f32);

        let handle = MatrixHandle::from_host(&client, &matrix).unwrap();

        assert_eq!(handle.shape(), (3, 2));
        assert_eq!(handle.check_storage(), Ok(()));
        assert_eq!(handle.to_host(&client).unwrap(), matrix);
    }

    #[test]
    fn reshaped_handle_no_longer_matches_its_buffer() {
        let client = CpuRuntime::client(&CpuDevice);
        let mut handle = MatrixHandle::<f64>::empty(&client, 2, 2).unwrap();
        handle.rows = 4;

        assert_eq!(
            handle.check_storage(),
            Err(MatmulInvalidProblem::StorageSize {
                rows: 4,
                cols: 2,
                len: 4
            })
        );
    }
}
