use smallvec::{SmallVec, smallvec};
use tilemm_runtime::{CubeElement, CubeKernel, KernelId, cube::UnitContext};

use crate::components::{MatmulProblem, TileConfig};

use super::{accumulate::accumulate, staging, writer};

const LHS_TILE: usize = 0;
const RHS_TILE: usize = 1;

/// Matmul staging square tiles of both operands in shared memory.
///
/// Every step along `M`, the units of a cube cooperatively copy one lhs tile and one rhs tile, meet
/// at the cube barrier, accumulate the products of the tiles and meet again before the tiles are
/// overwritten.
#[derive(new, Clone, Debug)]
pub struct TiledMatmul {
    problem: MatmulProblem,
    config: TileConfig,
}

impl<E: CubeElement> CubeKernel<E> for TiledMatmul {
    fn id(&self) -> KernelId {
        KernelId::new(
            "tiled_matmul",
            format!(
                "{}, {}, tile={}, cx={}, cy={}, {}",
                E::type_name(),
                self.problem,
                self.config.tile_size,
                self.config.coarse_factor_x,
                self.config.coarse_factor_y,
                self.config.unroll
            ),
        )
    }

    fn shared_memories(&self) -> Vec<usize> {
        vec![self.config.lhs_tile_len(), self.config.rhs_tile_len()]
    }

    fn execute(&self, unit: &UnitContext<'_, E>) {
        let (bx, by, _) = unit.cube_pos();
        let (tx, ty, _) = unit.unit_pos();
        let cube = (bx as usize, by as usize);
        let pos = (tx as usize, ty as usize);

        let (lhs, rhs) = (unit.input(0), unit.input(1));
        let (tile_lhs, tile_rhs) = (unit.shared(LHS_TILE), unit.shared(RHS_TILE));
        let mut acc: SmallVec<[E; 16]> = smallvec![E::zero(); self.config.accumulators()];

        let steps = self.problem.m / self.config.tile_size as usize;

        for step in 0..steps {
            staging::stage_lhs(tile_lhs, lhs, &self.problem, &self.config, cube.0, pos, step);
            staging::stage_rhs(tile_rhs, rhs, &self.problem, &self.config, cube.1, pos, step);
            unit.sync_cube();

            accumulate(&mut acc, tile_lhs, tile_rhs, &self.config, pos);
            unit.sync_cube();
        }

        writer::write(unit.output(), &acc, &self.problem, &self.config, cube, pos);
    }
}
