use tilemm_runtime::{CubeElement, cube::SharedMemory};

use crate::components::{MatmulProblem, TileConfig};

/// Copy the lhs tile of the given step, a `(cx·T) × T` block starting at row `bx·cx·T` and
/// column `step·T`.
///
/// Unit `(tx, ty)` stages the cells `(tx + i·T, ty)` of the tile for every `i < cx`, so the units of
/// a cube cover the tile exactly once.
pub(crate) fn stage_lhs<E: CubeElement>(
    tile: &SharedMemory<E>,
    lhs: &[E],
    problem: &MatmulProblem,
    config: &TileConfig,
    block_row: usize,
    (tx, ty): (usize, usize),
    step: usize,
) {
    let t = config.tile_size as usize;
    let row_start = block_row * config.block_rows();
    let col = step * t + ty;

    for i in 0..config.coarse_factor_x as usize {
        let row = tx + i * t;
        tile.write(row * t + ty, lhs[(row_start + row) * problem.m + col]);
    }
}

/// Copy the rhs tile of the given step, a `T × (cy·T)` block starting at row `step·T` and column
/// `by·cy·T`.
///
/// Unit `(tx, ty)` stages the cells `(tx, ty + j·T)` of the tile for every `j < cy`.
pub(crate) fn stage_rhs<E: CubeElement>(
    tile: &SharedMemory<E>,
    rhs: &[E],
    problem: &MatmulProblem,
    config: &TileConfig,
    block_col: usize,
    (tx, ty): (usize, usize),
    step: usize,
) {
    let t = config.tile_size as usize;
    let stride = config.block_cols();
    let row = step * t + tx;
    let col_start = block_col * stride;

    for j in 0..config.coarse_factor_y as usize {
        let col = ty + j * t;
        tile.write(tx * stride + col, rhs[row * problem.k + col_start + col]);
    }
}
