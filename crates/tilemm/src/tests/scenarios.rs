use tilemm_runtime::{CubeElement, Runtime, client::ComputeClient};

use crate::{
    Strategy,
    benchmark::{InputPattern, MatmulBenchmark},
    components::{
        MatmulDim, MatmulInvalidProblem, MatmulProblem, MatmulSetupError, Matrix, TileConfig,
        dispatch::simulate_writes,
    },
    matmul,
    reference::MatmulCheck,
};

use super::test_utils::{assert_exact, random_operands, supported_strategies};

/// A single tile step over matrices of ones.
pub fn test_single_tile_of_ones<R: Runtime, E: CubeElement>(client: ComputeClient<R::Server>) {
    let lhs = Matrix::<E>::filled(4, 4, E::one());
    let rhs = Matrix::<E>::filled(4, 4, E::one());

    let out = matmul::<R, E>(&client, &Strategy::tiling(), &lhs, &rhs).unwrap();

    assert_eq!(out, Matrix::filled(4, 4, E::from_int(4)));
}

/// Two tile steps over the checkerboard pattern.
pub fn test_checkerboard_two_steps<R: Runtime, E: CubeElement>(client: ComputeClient<R::Server>) {
    let problem = MatmulProblem::new(4, 8, 4);
    let (lhs, rhs) = InputPattern::Checkerboard.generate::<E>(&problem);

    let stats = assert_exact::<R, E>(&client, &Strategy::tiling(), &lhs, &rhs);
    let out = matmul::<R, E>(&client, &Strategy::tiling(), &lhs, &rhs).unwrap();

    for row in 0..4 {
        for col in 0..4 {
            let expected = if col % 2 == 0 { 4 } else { 0 };
            assert_eq!(out.get(row, col), Some(E::from_int(expected)));
        }
    }
    // One cube, two barriers per tile step.
    assert_eq!(stats.syncs, 4);
}

/// Coarsened tiles over random integers, where accumulation is exact.
pub fn test_coarsened_random_integers<R: Runtime, E: CubeElement>(
    client: ComputeClient<R::Server>,
) {
    let problem = MatmulProblem::new(16, 16, 16);

    for strategy in [
        Strategy::tiling_coarsening(),
        Strategy::tiling_coarsening_unroll(),
    ] {
        let report = MatmulBenchmark::new(
            problem,
            strategy,
            InputPattern::RandomInt { seed: 42, upper: 5 },
        )
        .run::<R, E>(&client)
        .unwrap();

        assert_eq!(report.check, MatmulCheck::Match, "{strategy}");
    }
}

/// Every named strategy able to solve the problem, over fractional inputs.
pub fn test_all_strategies_match_reference<R: Runtime, E: CubeElement>(
    client: ComputeClient<R::Server>,
) {
    let problem = MatmulProblem::new(16, 24, 32);
    let (lhs, rhs) = random_operands::<E>(&problem, 3);

    let strategies = supported_strategies(&problem);
    assert_eq!(strategies.len(), 8);

    for (_, strategy) in strategies {
        assert_exact::<R, E>(&client, &strategy, &lhs, &rhs);
    }
}

/// The checkerboard benchmark of the profiling binary reports no error.
pub fn test_checkerboard_benchmark<R: Runtime, E: CubeElement>(client: ComputeClient<R::Server>) {
    let problem = MatmulProblem::new(16, 32, 16);

    for (name, strategy) in Strategy::named() {
        let report = MatmulBenchmark::new(problem, strategy, InputPattern::Checkerboard)
            .run::<R, E>(&client)
            .unwrap();

        assert!(report.check.is_match(), "{name}: {}", report.check);
        assert!(!report.to_string().contains("Error"));
    }
}

/// A problem that isn't aligned with the tiles is rejected with the offending dimension.
pub fn test_unaligned_problem_is_rejected<R: Runtime, E: CubeElement>(
    client: ComputeClient<R::Server>,
) {
    let lhs = Matrix::<E>::zeros(10, 8);
    let rhs = Matrix::<E>::zeros(8, 8);

    let result = matmul::<R, E>(&client, &Strategy::tiling(), &lhs, &rhs);

    assert_eq!(
        result,
        Err(MatmulSetupError::InvalidProblem(
            MatmulInvalidProblem::NotDivisible {
                dim: MatmulDim::N,
                size: 10,
                factor: 4,
                reason: "tile_size × coarse_factor_x",
            }
        ))
    );
}

/// Running the same matmul twice gives bit-identical outputs.
pub fn test_repeated_launches_are_identical<R: Runtime, E: CubeElement>(
    client: ComputeClient<R::Server>,
) {
    let problem = MatmulProblem::new(8, 12, 16);
    let (lhs, rhs) = random_operands::<E>(&problem, 11);

    for strategy in [Strategy::naive_coarsening(), Strategy::tiling_coarsening()] {
        let first = matmul::<R, E>(&client, &strategy, &lhs, &rhs).unwrap();
        let second = matmul::<R, E>(&client, &strategy, &lhs, &rhs).unwrap();

        let bits = |matrix: &Matrix<E>| {
            matrix
                .as_slice()
                .iter()
                .map(|value| value.to_bits_u64())
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(&first), bits(&second), "{strategy}");
    }
}

/// Every output cell is written by exactly one unit, for every strategy and aligned shape.
pub fn test_partition_is_complete() {
    let problems = [
        MatmulProblem::new(4, 4, 4),
        MatmulProblem::new(8, 4, 16),
        MatmulProblem::new(16, 8, 8),
        MatmulProblem::new(24, 12, 40),
    ];

    for problem in problems {
        for (name, strategy) in supported_strategies(&problem) {
            let coverage = simulate_writes(&strategy, &problem).unwrap();
            assert_eq!(coverage.check(), Ok(()), "{name} on {problem}");
        }
    }

    let strategy = Strategy::Tiled(TileConfig {
        tile_size: 2,
        coarse_factor_x: 3,
        coarse_factor_y: 1,
        ..Default::default()
    });
    let problem = MatmulProblem::new(12, 6, 4);
    assert_eq!(simulate_writes(&strategy, &problem).unwrap().check(), Ok(()));
}
