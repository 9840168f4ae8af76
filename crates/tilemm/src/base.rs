use core::fmt::Display;

use tilemm_runtime::{
    CubeElement, Runtime,
    client::ComputeClient,
    server::{Bindings, ExecutionStats},
};

use crate::{
    components::{
        DispatchDescriptor, MatmulInvalidProblem, MatmulProblem, MatmulSetupError, Matrix,
        MatrixHandle, NaiveConfig, TileConfig, Unroll,
    },
    kernels::{naive::NaiveMatmul, tiled::TiledMatmul},
};

/// The matmul algorithm to launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Operands read from global memory, optionally coarsened.
    Naive(NaiveConfig),
    /// Operands staged in shared memory tiles, optionally coarsened.
    Tiled(TileConfig),
}

impl Default for Strategy {
    fn default() -> Self {
        Self::tiling()
    }
}

const COARSE_FACTOR: u32 = 2;
const TILE_SIZE: u32 = 4;

impl Strategy {
    pub fn naive() -> Self {
        Self::Naive(NaiveConfig::default())
    }

    pub fn naive_unroll() -> Self {
        Self::Naive(NaiveConfig {
            unroll: Unroll::Full,
            ..Default::default()
        })
    }

    pub fn naive_coarsening() -> Self {
        Self::Naive(NaiveConfig {
            coarse_factor_x: COARSE_FACTOR,
            coarse_factor_y: COARSE_FACTOR,
            ..Default::default()
        })
    }

    pub fn naive_coarsening_unroll() -> Self {
        Self::Naive(NaiveConfig {
            coarse_factor_x: COARSE_FACTOR,
            coarse_factor_y: COARSE_FACTOR,
            unroll: Unroll::Full,
            ..Default::default()
        })
    }

    pub fn tiling() -> Self {
        Self::Tiled(TileConfig {
            tile_size: TILE_SIZE,
            ..Default::default()
        })
    }

    pub fn tiling_unroll() -> Self {
        Self::Tiled(TileConfig {
            tile_size: TILE_SIZE,
            unroll: Unroll::Full,
            ..Default::default()
        })
    }

    pub fn tiling_coarsening() -> Self {
        Self::Tiled(TileConfig {
            tile_size: TILE_SIZE,
            coarse_factor_x: COARSE_FACTOR,
            coarse_factor_y: COARSE_FACTOR,
            unroll: Unroll::Disabled,
        })
    }

    pub fn tiling_coarsening_unroll() -> Self {
        Self::Tiled(TileConfig {
            tile_size: TILE_SIZE,
            coarse_factor_x: COARSE_FACTOR,
            coarse_factor_y: COARSE_FACTOR,
            unroll: Unroll::Full,
        })
    }

    /// Every named variant, from the simplest to the most optimized.
    pub fn named() -> [(&'static str, Strategy); 8] {
        [
            ("naive", Self::naive()),
            ("naive_unroll", Self::naive_unroll()),
            ("naive_coarsening", Self::naive_coarsening()),
            ("naive_coarsening_unroll", Self::naive_coarsening_unroll()),
            ("tiling", Self::tiling()),
            ("tiling_unroll", Self::tiling_unroll()),
            ("tiling_coarsening", Self::tiling_coarsening()),
            ("tiling_coarsening_unroll", Self::tiling_coarsening_unroll()),
        ]
    }

    /// Look up a named variant.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::named()
            .into_iter()
            .find_map(|(candidate, strategy)| (candidate == name).then_some(strategy))
    }

    /// Check that the strategy can solve `problem`.
    pub fn validate(&self, problem: &MatmulProblem) -> Result<(), MatmulSetupError> {
        problem.validate()?;

        match self {
            Strategy::Naive(config) => config.validate(problem),
            Strategy::Tiled(config) => config.validate(problem),
        }
    }

    /// Grid of the launch. Only meaningful once [validate](Strategy::validate) succeeded.
    pub fn dispatch(&self, problem: &MatmulProblem) -> DispatchDescriptor {
        match self {
            Strategy::Naive(config) => DispatchDescriptor::naive(problem, config),
            Strategy::Tiled(config) => DispatchDescriptor::tiled(problem, config),
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Strategy::Naive(config) => write!(
                f,
                "naive(cube_dim={}x{}, cx={}, cy={}, {})",
                config.cube_dim_x,
                config.cube_dim_y,
                config.coarse_factor_x,
                config.coarse_factor_y,
                config.unroll
            ),
            Strategy::Tiled(config) => write!(
                f,
                "tiled(tile={}, cx={}, cy={}, {})",
                config.tile_size, config.coarse_factor_x, config.coarse_factor_y, config.unroll
            ),
        }
    }
}

/// Launch a matmul over operands already on the device, writing into `out`.
///
/// The problem is inferred from the operand shapes. Nothing is launched when the shapes or the
/// strategy are invalid.
pub fn launch_ref<R: Runtime, E: CubeElement>(
    client: &ComputeClient<R::Server>,
    strategy: &Strategy,
    lhs: &MatrixHandle<E>,
    rhs: &MatrixHandle<E>,
    out: &MatrixHandle<E>,
) -> Result<ExecutionStats, MatmulSetupError> {
    for matrix in [lhs, rhs, out] {
        matrix.check_storage()?;
    }

    let problem = MatmulProblem::from_shapes(lhs.shape(), rhs.shape())?;
    if out.shape() != problem.out_shape() {
        return Err(MatmulInvalidProblem::OutputMismatch {
            expected: problem.out_shape(),
            got: out.shape(),
        }
        .into());
    }
    strategy.validate(&problem)?;

    let descriptor = strategy.dispatch(&problem);
    let bindings = Bindings::new(out.handle.clone())
        .with_inputs([lhs.handle.clone(), rhs.handle.clone()]);

    log::debug!(
        "Launching {strategy} on {problem}: {} cubes of {} units",
        descriptor.cube_count,
        descriptor.cube_dim
    );

    let stats = match strategy {
        Strategy::Naive(config) => client.launch::<E, _>(
            &NaiveMatmul::new(problem, *config),
            descriptor.cube_count,
            descriptor.cube_dim,
            bindings,
        )?,
        Strategy::Tiled(config) => client.launch::<E, _>(
            &TiledMatmul::new(problem, *config),
            descriptor.cube_count,
            descriptor.cube_dim,
            bindings,
        )?,
    };

    check_written(&problem, &stats)?;

    Ok(stats)
}

/// Every output cell must have been written by exactly one unit.
fn check_written(
    problem: &MatmulProblem,
    stats: &ExecutionStats,
) -> Result<(), MatmulSetupError> {
    let expected = problem.n * problem.k;
    if stats.written != expected {
        return Err(MatmulSetupError::IncompleteOutput {
            written: stats.written,
            expected,
        });
    }

    Ok(())
}

/// Multiply two host matrices on the device of `client`.
///
/// The strategy is validated before any allocation, so an invalid problem never touches device
/// memory.
pub fn matmul<R: Runtime, E: CubeElement>(
    client: &ComputeClient<R::Server>,
    strategy: &Strategy,
    lhs: &Matrix<E>,
    rhs: &Matrix<E>,
) -> Result<Matrix<E>, MatmulSetupError> {
    let (out, _) = matmul_with_stats::<R, E>(client, strategy, lhs, rhs)?;
    Ok(out)
}

/// Same as [matmul], also returning what the runtime measured during the launch.
pub fn matmul_with_stats<R: Runtime, E: CubeElement>(
    client: &ComputeClient<R::Server>,
    strategy: &Strategy,
    lhs: &Matrix<E>,
    rhs: &Matrix<E>,
) -> Result<(Matrix<E>, ExecutionStats), MatmulSetupError> {
    let problem = MatmulProblem::from_matrices(lhs, rhs)?;
    strategy.validate(&problem)?;

    let lhs = MatrixHandle::from_host(client, lhs)?;
    let rhs = MatrixHandle::from_host(client, rhs)?;
    let out = MatrixHandle::empty(client, problem.n, problem.k)?;

    let stats = launch_ref::<R, E>(client, strategy, &lhs, &rhs, &out)?;

    Ok((out.to_host(client)?, stats))
}
