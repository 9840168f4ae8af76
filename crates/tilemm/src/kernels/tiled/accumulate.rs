use tilemm_runtime::{CubeElement, cube::SharedMemory};

use crate::{components::TileConfig, kernels::unroll::unrolled};

/// Multiply-accumulate the staged tiles into the unit's accumulators.
///
/// `acc[i·cy + j]` accumulates the output `(tx + i·T, ty + j·T)` of the cube, over the `T` columns
/// of the lhs tile in increasing order.
pub(crate) fn accumulate<E: CubeElement>(
    acc: &mut [E],
    tile_lhs: &SharedMemory<E>,
    tile_rhs: &SharedMemory<E>,
    config: &TileConfig,
    (tx, ty): (usize, usize),
) {
    let t = config.tile_size as usize;
    let (cx, cy) = (config.coarse_factor_x as usize, config.coarse_factor_y as usize);
    let stride = config.block_cols();

    unrolled(t, config.unroll, |k| {
        for i in 0..cx {
            let a = tile_lhs.read((tx + i * t) * t + k);
            for j in 0..cy {
                let b = tile_rhs.read(k * stride + ty + j * t);
                acc[i * cy + j] = acc[i * cy + j] + a * b;
            }
        }
    });
}
