use tilemm_runtime::server::{IoError, LaunchError};

use super::MatmulDim;

/// Errors that can occur during the setup phase of a matmul operation.
///
/// Problem and config errors are always detected before any device memory is touched.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum MatmulSetupError {
    /// The problem can't be solved with the selected strategy.
    #[error("Unable to launch matmul because the problem is invalid: {0}")]
    InvalidProblem(#[from] MatmulInvalidProblem),

    /// The provided configuration is invalid.
    #[error("Unable to launch matmul because the config is invalid: {0}")]
    InvalidConfig(#[from] InvalidConfigError),

    /// The runtime refused or failed the launch.
    #[error("Unable to launch matmul: {0}")]
    Launch(#[from] LaunchError),

    /// Moving data to or from the device failed.
    #[error("Unable to move matmul data: {0}")]
    Io(#[from] IoError),

    /// The launch succeeded but some output cells were never written.
    #[error("Matmul wrote {written} of the {expected} output cells")]
    IncompleteOutput { written: usize, expected: usize },
}

/// The problem shape doesn't fit the strategy.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum MatmulInvalidProblem {
    /// A dimension isn't a multiple of a tiling or coarsening product.
    #[error("{dim}={size} must be a multiple of {factor} ({reason})")]
    NotDivisible {
        dim: MatmulDim,
        size: usize,
        factor: usize,
        reason: &'static str,
    },

    /// The lhs columns don't match the rhs rows.
    #[error("lhs of shape {lhs:?} can't be multiplied with rhs of shape {rhs:?}")]
    ShapeMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    /// The output buffer doesn't have the `N×K` shape of the problem.
    #[error("output of shape {got:?} doesn't match the expected {expected:?}")]
    OutputMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// A matrix storage doesn't hold `rows × cols` elements.
    #[error("a {rows}×{cols} matrix needs {} elements, got {len}", .rows * .cols)]
    StorageSize { rows: usize, cols: usize, len: usize },

    /// Empty matrices are not supported.
    #[error("dimension {dim} is empty")]
    ZeroSize { dim: MatmulDim },
}

/// A parameter of the configuration is out of range.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum InvalidConfigError {
    /// Parameter that must be strictly positive.
    #[error("{name} must be at least 1")]
    Zero { name: &'static str },

    /// The units of a cube can't be counted in a `u32`.
    #[error("a cube of {x}×{y} units is too large")]
    CubeTooLarge { x: u32, y: u32 },
}

impl InvalidConfigError {
    /// Fails when `value` is zero.
    pub fn check_positive(name: &'static str, value: u32) -> Result<(), Self> {
        match value {
            0 => Err(Self::Zero { name }),
            _ => Ok(()),
        }
    }

    /// Fails when the unit count of a `x × y` cube overflows.
    pub fn check_cube_dim(x: u32, y: u32) -> Result<(), Self> {
        match x.checked_mul(y) {
            Some(_) => Ok(()),
            None => Err(Self::CubeTooLarge { x, y }),
        }
    }
}
