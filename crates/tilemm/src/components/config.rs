use core::fmt::Display;
use serde::{Deserialize, Serialize};

use super::{InvalidConfigError, MatmulDim, MatmulProblem, MatmulSetupError};

/// How far the innermost loops are unrolled.
///
/// Unrolling never changes results: every accumulator still receives its products in increasing
/// order of the reduced index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unroll {
    /// Plain loops.
    #[default]
    Disabled,
    /// The loop over a tile is fully unrolled, chunks of the whole reduced length elsewhere.
    Full,
    /// Unrolled by the given number of iterations.
    Step(u32),
}

impl Unroll {
    /// Number of iterations executed per chunk for a loop of `len` iterations.
    pub fn step(&self, len: usize) -> usize {
        match self {
            Unroll::Disabled => 1,
            Unroll::Full => len.max(1),
            Unroll::Step(step) => (*step as usize).clamp(1, len.max(1)),
        }
    }

    fn validate(&self) -> Result<(), InvalidConfigError> {
        match self {
            Unroll::Step(step) => InvalidConfigError::check_positive("unroll step", *step),
            _ => Ok(()),
        }
    }
}

impl Display for Unroll {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Unroll::Disabled => f.write_str("no_unroll"),
            Unroll::Full => f.write_str("unroll"),
            Unroll::Step(step) => write!(f, "unroll_{step}"),
        }
    }
}

/// Configuration of the naive kernels, where units only read global memory.
///
/// With both coarsening factors at 1, every unit computes exactly one output cell. Otherwise a unit
/// at `(x, y)` computes the rows `x + i·N/cx` and the columns `y + j·K/cy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaiveConfig {
    pub cube_dim_x: u32,
    pub cube_dim_y: u32,
    pub coarse_factor_x: u32,
    pub coarse_factor_y: u32,
    pub unroll: Unroll,
}

impl Default for NaiveConfig {
    fn default() -> Self {
        Self {
            cube_dim_x: 4,
            cube_dim_y: 4,
            coarse_factor_x: 1,
            coarse_factor_y: 1,
            unroll: Unroll::Disabled,
        }
    }
}

impl NaiveConfig {
    pub fn validate(&self, problem: &MatmulProblem) -> Result<(), MatmulSetupError> {
        InvalidConfigError::check_positive("cube_dim_x", self.cube_dim_x)?;
        InvalidConfigError::check_positive("cube_dim_y", self.cube_dim_y)?;
        InvalidConfigError::check_positive("coarse_factor_x", self.coarse_factor_x)?;
        InvalidConfigError::check_positive("coarse_factor_y", self.coarse_factor_y)?;
        InvalidConfigError::check_cube_dim(self.cube_dim_x, self.cube_dim_y)?;
        self.unroll.validate()?;

        problem.check_divisible(MatmulDim::N, self.coarse_factor_x as usize, "coarse_factor_x")?;
        problem.check_divisible(MatmulDim::K, self.coarse_factor_y as usize, "coarse_factor_y")?;

        Ok(())
    }

    pub fn is_coarsened(&self) -> bool {
        self.coarse_factor_x > 1 || self.coarse_factor_y > 1
    }
}

/// Configuration of the tiled kernel.
///
/// A cube has `tile_size × tile_size` units. Each unit owns `coarse_factor_x × coarse_factor_y`
/// outputs spaced by `tile_size`, so a cube covers a `(cx·T) × (cy·T)` block of the output and the
/// tiles staged in shared memory are `(cx·T) × T` for the lhs and `T × (cy·T)` for the rhs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileConfig {
    pub tile_size: u32,
    pub coarse_factor_x: u32,
    pub coarse_factor_y: u32,
    pub unroll: Unroll,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            tile_size: 4,
            coarse_factor_x: 1,
            coarse_factor_y: 1,
            unroll: Unroll::Disabled,
        }
    }
}

impl TileConfig {
    pub fn validate(&self, problem: &MatmulProblem) -> Result<(), MatmulSetupError> {
        InvalidConfigError::check_positive("tile_size", self.tile_size)?;
        InvalidConfigError::check_positive("coarse_factor_x", self.coarse_factor_x)?;
        InvalidConfigError::check_positive("coarse_factor_y", self.coarse_factor_y)?;
        InvalidConfigError::check_cube_dim(self.tile_size, self.tile_size)?;
        self.unroll.validate()?;

        problem.check_divisible(MatmulDim::N, self.block_rows(), "tile_size × coarse_factor_x")?;
        problem.check_divisible(MatmulDim::K, self.block_cols(), "tile_size × coarse_factor_y")?;
        problem.check_divisible(MatmulDim::M, self.tile_size as usize, "tile_size")?;

        Ok(())
    }

    /// Output rows covered by one cube.
    pub fn block_rows(&self) -> usize {
        self.tile_size as usize * self.coarse_factor_x as usize
    }

    /// Output columns covered by one cube.
    pub fn block_cols(&self) -> usize {
        self.tile_size as usize * self.coarse_factor_y as usize
    }

    /// Elements of the lhs tile.
    pub fn lhs_tile_len(&self) -> usize {
        self.block_rows() * self.tile_size as usize
    }

    /// Elements of the rhs tile.
    pub fn rhs_tile_len(&self) -> usize {
        self.tile_size as usize * self.block_cols()
    }

    /// Accumulators owned by every unit.
    pub fn accumulators(&self) -> usize {
        self.coarse_factor_x as usize * self.coarse_factor_y as usize
    }

    pub fn is_coarsened(&self) -> bool {
        self.coarse_factor_x > 1 || self.coarse_factor_y > 1
    }
}
