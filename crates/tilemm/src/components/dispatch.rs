//! Dispatch shapes of the matmul strategies, and a host-side replay of the output positions every
//! unit of a dispatch writes.

use tilemm_runtime::{CubeDim, server::CubeCount};

use crate::{
    Strategy,
    kernels::{naive, tiled},
};

use super::{MatmulProblem, MatmulSetupError, NaiveConfig, TileConfig};

/// Grid of a matmul launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchDescriptor {
    /// Units needed along `(N, K)`, one per output super-cell.
    pub global_extent: (usize, usize),
    pub cube_dim: CubeDim,
    pub cube_count: CubeCount,
}

impl DispatchDescriptor {
    /// One unit per super-cell, rounded up to whole cubes. Units past the extent write nothing.
    pub fn naive(problem: &MatmulProblem, config: &NaiveConfig) -> Self {
        let global_extent = (
            problem.n / config.coarse_factor_x as usize,
            problem.k / config.coarse_factor_y as usize,
        );
        let cube_dim = CubeDim::new_2d(config.cube_dim_x, config.cube_dim_y);
        let cube_count = CubeCount::new_2d(
            cube_count(global_extent.0, config.cube_dim_x),
            cube_count(global_extent.1, config.cube_dim_y),
        );

        Self {
            global_extent,
            cube_dim,
            cube_count,
        }
    }

    /// Square cubes of `tile_size × tile_size` units, one cube per output block.
    pub fn tiled(problem: &MatmulProblem, config: &TileConfig) -> Self {
        let global_extent = (
            problem.n / config.coarse_factor_x as usize,
            problem.k / config.coarse_factor_y as usize,
        );
        let cube_dim = CubeDim::new_2d(config.tile_size, config.tile_size);
        let cube_count = CubeCount::new_2d(
            cube_count(global_extent.0, config.tile_size),
            cube_count(global_extent.1, config.tile_size),
        );

        Self {
            global_extent,
            cube_dim,
            cube_count,
        }
    }

    /// Units launched, including the idle ones of partial cubes.
    pub fn num_units(&self) -> u64 {
        let cubes = self.cube_count.num_cubes();
        cubes.saturating_mul(self.cube_dim.num_elems() as u64)
    }
}

// Too many cubes saturate to u32::MAX, which the runtime then rejects with the actual limit.
fn cube_count(extent: usize, cube_dim: u32) -> u32 {
    let count = extent.div_ceil(cube_dim.max(1) as usize);
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// A cell of the output that wasn't written exactly once.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoverageDefect {
    #[error("Output cell ({row}, {col}) is never written")]
    Gap { row: usize, col: usize },
    #[error("Output cell ({row}, {col}) is written {writes} times")]
    Overlap {
        row: usize,
        col: usize,
        writes: u32,
    },
    #[error("A unit writes ({row}, {col}), outside of the output")]
    OutOfBounds { row: usize, col: usize },
}

/// Number of writes each output cell receives during a dispatch.
#[derive(Clone, Debug)]
pub struct WriteCoverage {
    rows: usize,
    cols: usize,
    writes: Vec<u32>,
    out_of_bounds: Option<(usize, usize)>,
}

impl WriteCoverage {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            writes: vec![0; rows * cols],
            out_of_bounds: None,
        }
    }

    fn record(&mut self, row: usize, col: usize) {
        if row >= self.rows || col >= self.cols {
            self.out_of_bounds.get_or_insert((row, col));
            return;
        }
        self.writes[row * self.cols + col] += 1;
    }

    /// Writes received by `(row, col)`.
    pub fn writes(&self, row: usize, col: usize) -> u32 {
        self.writes[row * self.cols + col]
    }

    /// Fails on the first cell, in row-major order, that isn't written exactly once.
    pub fn check(&self) -> Result<(), CoverageDefect> {
        if let Some((row, col)) = self.out_of_bounds {
            return Err(CoverageDefect::OutOfBounds { row, col });
        }

        for (index, writes) in self.writes.iter().enumerate() {
            let (row, col) = (index / self.cols, index % self.cols);
            match writes {
                1 => {}
                0 => return Err(CoverageDefect::Gap { row, col }),
                writes => {
                    return Err(CoverageDefect::Overlap {
                        row,
                        col,
                        writes: *writes,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Replay the output positions computed by every unit of the dispatch of `strategy`.
///
/// The positions come from the same functions the kernels use, so a valid strategy always yields a
/// complete coverage.
pub fn simulate_writes(
    strategy: &Strategy,
    problem: &MatmulProblem,
) -> Result<WriteCoverage, MatmulSetupError> {
    strategy.validate(problem)?;

    let descriptor = strategy.dispatch(problem);
    let mut coverage = WriteCoverage::new(problem.n, problem.k);
    let CubeDim { x: dim_x, y: dim_y, .. } = descriptor.cube_dim;

    for cube in 0..descriptor.cube_count.num_cubes() {
        let (bx, by, _) = descriptor.cube_count.cube_pos(cube);

        for unit in 0..descriptor.cube_dim.num_elems() {
            let (tx, ty, _) = descriptor.cube_dim.unit_pos(unit);

            let outputs = match strategy {
                Strategy::Naive(config) => naive::unit_outputs(
                    problem,
                    config,
                    (bx * dim_x + tx) as usize,
                    (by * dim_y + ty) as usize,
                ),
                Strategy::Tiled(config) => tiled::unit_outputs(
                    config,
                    (bx as usize, by as usize),
                    (tx as usize, ty as usize),
                ),
            };

            for (row, col) in outputs {
                coverage.record(row, col);
            }
        }
    }

    Ok(coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Unroll;

    #[test]
    fn naive_cube_count_is_rounded_up() {
        let problem = MatmulProblem::new(10, 3, 6);
        let descriptor = DispatchDescriptor::naive(&problem, &NaiveConfig::default());

        assert_eq!(descriptor.global_extent, (10, 6));
        assert_eq!(descriptor.cube_count, CubeCount::new_2d(3, 2));
        assert_eq!(descriptor.num_units(), 96);
    }

    #[test]
    fn tiled_cubes_cover_one_block_each() {
        let problem = MatmulProblem::new(16, 4, 32);
        let config = TileConfig {
            tile_size: 4,
            coarse_factor_x: 2,
            coarse_factor_y: 4,
            unroll: Unroll::Disabled,
        };

        let descriptor = DispatchDescriptor::tiled(&problem, &config);

        assert_eq!(descriptor.global_extent, (8, 8));
        assert_eq!(descriptor.cube_dim, CubeDim::new_2d(4, 4));
        assert_eq!(descriptor.cube_count, CubeCount::new_2d(2, 2));
    }

    #[test]
    fn check_reports_the_first_defect() {
        let mut coverage = WriteCoverage::new(2, 2);
        coverage.record(0, 0);
        coverage.record(0, 1);
        coverage.record(0, 1);

        assert_eq!(
            coverage.check(),
            Err(CoverageDefect::Overlap {
                row: 0,
                col: 1,
                writes: 2
            })
        );

        coverage.record(5, 0);
        assert_eq!(
            coverage.check(),
            Err(CoverageDefect::OutOfBounds { row: 5, col: 0 })
        );
    }

    #[test]
    fn missing_cells_are_gaps() {
        let mut coverage = WriteCoverage::new(1, 2);
        coverage.record(0, 0);

        assert_eq!(coverage.check(), Err(CoverageDefect::Gap { row: 0, col: 1 }));
    }
}
