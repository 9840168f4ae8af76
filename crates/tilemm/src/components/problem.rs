use core::fmt::Display;
use serde::{Deserialize, Serialize};

use tilemm_runtime::CubeElement;

use super::{MatmulInvalidProblem, Matrix};

/// Dimensions of `C (N×K) = A (N×M) × B (M×K)`.
#[derive(new, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatmulProblem {
    /// Rows of the lhs and of the output.
    pub n: usize,
    /// Columns of the lhs, rows of the rhs. The dimension being reduced.
    pub m: usize,
    /// Columns of the rhs and of the output.
    pub k: usize,
}

/// Names one dimension of a [MatmulProblem].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatmulDim {
    N,
    M,
    K,
}

impl Display for MatmulDim {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MatmulDim::N => f.write_str("N"),
            MatmulDim::M => f.write_str("M"),
            MatmulDim::K => f.write_str("K"),
        }
    }
}

impl MatmulProblem {
    /// Infer the problem from the shapes `(rows, cols)` of both operands.
    pub fn from_shapes(
        lhs: (usize, usize),
        rhs: (usize, usize),
    ) -> Result<Self, MatmulInvalidProblem> {
        if lhs.1 != rhs.0 {
            return Err(MatmulInvalidProblem::ShapeMismatch { lhs, rhs });
        }

        let problem = Self::new(lhs.0, lhs.1, rhs.1);
        problem.validate()?;
        Ok(problem)
    }

    /// Infer the problem from both host operands.
    pub fn from_matrices<E: CubeElement>(
        lhs: &Matrix<E>,
        rhs: &Matrix<E>,
    ) -> Result<Self, MatmulInvalidProblem> {
        Self::from_shapes(lhs.shape(), rhs.shape())
    }

    /// Every dimension must hold at least one element.
    pub fn validate(&self) -> Result<(), MatmulInvalidProblem> {
        for (dim, size) in self.dims() {
            if size == 0 {
                return Err(MatmulInvalidProblem::ZeroSize { dim });
            }
        }
        Ok(())
    }

    /// Size of the given dimension.
    pub fn size(&self, dim: MatmulDim) -> usize {
        match dim {
            MatmulDim::N => self.n,
            MatmulDim::M => self.m,
            MatmulDim::K => self.k,
        }
    }

    /// Fails unless `dim` is a multiple of `factor`.
    pub fn check_divisible(
        &self,
        dim: MatmulDim,
        factor: usize,
        reason: &'static str,
    ) -> Result<(), MatmulInvalidProblem> {
        let size = self.size(dim);

        match size % factor {
            0 => Ok(()),
            _ => Err(MatmulInvalidProblem::NotDivisible {
                dim,
                size,
                factor,
                reason,
            }),
        }
    }

    pub fn lhs_shape(&self) -> (usize, usize) {
        (self.n, self.m)
    }

    pub fn rhs_shape(&self) -> (usize, usize) {
        (self.m, self.k)
    }

    pub fn out_shape(&self) -> (usize, usize) {
        (self.n, self.k)
    }

    fn dims(&self) -> [(MatmulDim, usize); 3] {
        [
            (MatmulDim::N, self.n),
            (MatmulDim::M, self.m),
            (MatmulDim::K, self.k),
        ]
    }
}

impl Display for MatmulProblem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "N={} M={} K={}", self.n, self.m, self.k)
    }
}
