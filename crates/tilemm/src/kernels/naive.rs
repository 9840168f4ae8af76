//! Naive matmul kernel implementation
//!
//! Units read their operands straight from global memory. Without coarsening each unit computes a
//! single element of the output matrix; with coarsening, a unit at `(x, y)` owns the rows
//! `x + i·N/cx` and the columns `y + j·K/cy`, so the units of a cube stay on neighbouring cells.

use smallvec::{SmallVec, smallvec};
use tilemm_runtime::{CubeElement, CubeKernel, KernelId, cube::UnitContext};

use crate::components::{MatmulProblem, NaiveConfig};

use super::unroll::unrolled;

/// Output cells of the unit at the absolute position `(x, y)`, row-major over its block.
///
/// Units past the global extent own nothing.
pub fn unit_outputs(
    problem: &MatmulProblem,
    config: &NaiveConfig,
    x: usize,
    y: usize,
) -> SmallVec<[(usize, usize); 16]> {
    let (cx, cy) = (config.coarse_factor_x as usize, config.coarse_factor_y as usize);
    let (rows, cols) = (problem.n / cx, problem.k / cy);

    if x >= rows || y >= cols {
        return SmallVec::new();
    }

    (0..cx)
        .flat_map(|i| (0..cy).map(move |j| (x + i * rows, y + j * cols)))
        .collect()
}

/// Global memory matmul, see the module documentation.
#[derive(new, Clone, Debug)]
pub struct NaiveMatmul {
    problem: MatmulProblem,
    config: NaiveConfig,
}

impl<E: CubeElement> CubeKernel<E> for NaiveMatmul {
    fn id(&self) -> KernelId {
        KernelId::new(
            "naive_matmul",
            format!(
                "{}, {}, cx={}, cy={}, {}",
                E::type_name(),
                self.problem,
                self.config.coarse_factor_x,
                self.config.coarse_factor_y,
                self.config.unroll
            ),
        )
    }

    fn execute(&self, unit: &UnitContext<'_, E>) {
        let (x, y, _) = unit.absolute_pos();
        let outputs = unit_outputs(&self.problem, &self.config, x as usize, y as usize);
        if outputs.is_empty() {
            return;
        }

        let (m, k) = (self.problem.m, self.problem.k);
        let (lhs, rhs) = (unit.input(0), unit.input(1));
        let cy = self.config.coarse_factor_y as usize;
        let mut acc: SmallVec<[E; 16]> = smallvec![E::zero(); outputs.len()];

        unrolled(m, self.config.unroll, |shared| {
            for i in 0..outputs.len() / cy {
                let a = lhs[outputs[i * cy].0 * m + shared];
                for j in 0..cy {
                    let (_, col) = outputs[i * cy + j];
                    acc[i * cy + j] = acc[i * cy + j] + a * rhs[shared * k + col];
                }
            }
        });

        for ((row, col), value) in outputs.iter().zip(acc) {
            unit.output().write(row * k + col, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Unroll;

    #[test]
    fn coarsened_units_own_strided_cells() {
        let problem = MatmulProblem::new(8, 3, 6);
        let config = NaiveConfig {
            coarse_factor_x: 2,
            coarse_factor_y: 3,
            unroll: Unroll::Disabled,
            ..Default::default()
        };

        let outputs = unit_outputs(&problem, &config, 1, 0);

        assert_eq!(
            outputs.as_slice(),
            &[(1, 0), (1, 2), (1, 4), (5, 0), (5, 2), (5, 4)]
        );
        assert!(unit_outputs(&problem, &config, 4, 0).is_empty());
        assert!(unit_outputs(&problem, &config, 0, 2).is_empty());
    }
}
