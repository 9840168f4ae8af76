use smallvec::SmallVec;
use tilemm_runtime::{CubeElement, cube::GlobalOutput};

use crate::components::{MatmulProblem, TileConfig};

/// Output cells of unit `(tx, ty)` in cube `(bx, by)`, in accumulator order.
pub fn unit_outputs(
    config: &TileConfig,
    (bx, by): (usize, usize),
    (tx, ty): (usize, usize),
) -> SmallVec<[(usize, usize); 16]> {
    let t = config.tile_size as usize;
    let row_start = bx * config.block_rows() + tx;
    let col_start = by * config.block_cols() + ty;

    let cols = config.coarse_factor_y as usize;

    (0..config.coarse_factor_x as usize)
        .flat_map(|i| (0..cols).map(move |j| (row_start + i * t, col_start + j * t)))
        .collect()
}

pub(crate) fn write<E: CubeElement>(
    output: &GlobalOutput<E>,
    acc: &[E],
    problem: &MatmulProblem,
    config: &TileConfig,
    cube: (usize, usize),
    unit: (usize, usize),
) {
    for ((row, col), value) in unit_outputs(config, cube, unit).into_iter().zip(acc) {
        output.write(row * problem.k + col, *value);
    }
}
