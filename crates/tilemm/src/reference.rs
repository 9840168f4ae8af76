//! Sequential matmul used to check the kernels.

use core::fmt::Display;

use tilemm_runtime::CubeElement;

use crate::components::{MatmulInvalidProblem, MatmulProblem, Matrix};

/// Triple loop matmul, iterating rows, then the reduced dimension, then columns.
///
/// Every output cell starts at zero and receives its products in increasing order of the reduced
/// index, the same order the kernels use, so results can be compared exactly.
pub fn matmul_cpu<E: CubeElement>(
    lhs: &Matrix<E>,
    rhs: &Matrix<E>,
) -> Result<Matrix<E>, MatmulInvalidProblem> {
    let problem = MatmulProblem::from_matrices(lhs, rhs)?;
    let (lhs, rhs) = (lhs.as_slice(), rhs.as_slice());
    let mut out = vec![E::zero(); problem.n * problem.k];

    for i in 0..problem.n {
        for shared in 0..problem.m {
            let a = lhs[i * problem.m + shared];
            for k in 0..problem.k {
                let cell = &mut out[i * problem.k + k];
                *cell = *cell + a * rhs[shared * problem.k + k];
            }
        }
    }

    Matrix::new(problem.n, problem.k, out)
}

/// Outcome of [compare].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatmulCheck<E> {
    Match,
    /// First cell, in row-major order, further than epsilon from the expected value.
    Mismatch {
        row: usize,
        col: usize,
        got: E,
        expected: E,
    },
}

impl<E> MatmulCheck<E> {
    pub fn is_match(&self) -> bool {
        matches!(self, MatmulCheck::Match)
    }
}

impl<E: Display> Display for MatmulCheck<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MatmulCheck::Match => f.write_str("match"),
            MatmulCheck::Mismatch { row, col, got, .. } => write!(f, "({row}, {col}): got {got}"),
        }
    }
}

/// Find the first cell of `actual` further than `epsilon` from `expected`.
///
/// NaN never matches, so cells computed from uninitialized shared memory are always reported.
pub fn compare<E: CubeElement>(
    actual: &Matrix<E>,
    expected: &Matrix<E>,
    epsilon: E,
) -> Result<MatmulCheck<E>, MatmulInvalidProblem> {
    if actual.shape() != expected.shape() {
        return Err(MatmulInvalidProblem::OutputMismatch {
            expected: expected.shape(),
            got: actual.shape(),
        });
    }

    let cols = actual.cols();
    let mismatch = actual
        .as_slice()
        .iter()
        .zip(expected.as_slice())
        .position(|(got, expected)| {
            let diff = (*got - *expected).abs();
            diff.is_nan() || diff > epsilon
        });

    Ok(match mismatch {
        None => MatmulCheck::Match,
        Some(index) => MatmulCheck::Mismatch {
            row: index / cols,
            col: index % cols,
            got: actual.as_slice()[index],
            expected: expected.as_slice()[index],
        },
    })
}
