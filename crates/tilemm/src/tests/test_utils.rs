use rand::{Rng, SeedableRng, rngs::StdRng};
use tilemm_runtime::{CubeElement, Runtime, client::ComputeClient, server::ExecutionStats};

use crate::{
    Strategy,
    components::{MatmulProblem, Matrix},
    matmul_with_stats,
    reference::{MatmulCheck, compare, matmul_cpu},
};

/// Operands with arbitrary fractional values in `[-1, 1)`.
pub fn random_operands<E: CubeElement>(
    problem: &MatmulProblem,
    seed: u64,
) -> (Matrix<E>, Matrix<E>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sample = |_: usize, _: usize| {
        let value: f64 = rng.random_range(-1.0..1.0);
        <E as num_traits::NumCast>::from(value).unwrap()
    };

    let lhs = Matrix::from_fn(problem.n, problem.m, &mut sample);
    let rhs = Matrix::from_fn(problem.m, problem.k, &mut sample);
    (lhs, rhs)
}

/// Run `strategy` and check that it reproduces the reference exactly.
///
/// The kernels and the reference accumulate in the same order, so even fractional inputs must give
/// bit-identical outputs.
pub fn assert_exact<R: Runtime, E: CubeElement>(
    client: &ComputeClient<R::Server>,
    strategy: &Strategy,
    lhs: &Matrix<E>,
    rhs: &Matrix<E>,
) -> ExecutionStats {
    let (out, stats) = matmul_with_stats::<R, E>(client, strategy, lhs, rhs)
        .unwrap_or_else(|err| panic!("{strategy} failed: {err}"));
    let expected = matmul_cpu(lhs, rhs).unwrap();

    if let MatmulCheck::Mismatch { .. } = compare(&out, &expected, E::zero()).unwrap() {
        pretty_assertions::assert_eq!(out.as_slice(), expected.as_slice(), "{strategy}");
    }
    assert_eq!(stats.written, out.rows() * out.cols(), "{strategy}");

    stats
}

/// Named strategies able to solve `problem`.
pub fn supported_strategies(problem: &MatmulProblem) -> Vec<(&'static str, Strategy)> {
    Strategy::named()
        .into_iter()
        .filter(|(_, strategy)| strategy.validate(problem).is_ok())
        .collect()
}
