//! Timed matmul runs with a correctness check, as reported by the profiling binary.

use core::fmt::Display;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tilemm_runtime::{CubeElement, Runtime, client::ComputeClient};

use crate::{
    Strategy,
    components::{MatmulProblem, MatmulSetupError, Matrix, MatrixHandle},
    launch_ref,
    reference::{self, MatmulCheck},
};

/// How the operands of a benchmark are filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputPattern {
    /// `A[i] = i % 2` and `B[i] = (i + 1) % 2` over the flat storages.
    Checkerboard,
    /// Integers drawn uniformly in `[0, upper)`, reproducible from the seed.
    RandomInt { seed: u64, upper: u32 },
}

impl InputPattern {
    /// Operands `(A, B)` of the problem.
    pub fn generate<E: CubeElement>(&self, problem: &MatmulProblem) -> (Matrix<E>, Matrix<E>) {
        let (n, m, k) = (problem.n, problem.m, problem.k);

        match self {
            InputPattern::Checkerboard => (
                Matrix::from_fn(n, m, |row, col| E::from_int(((row * m + col) % 2) as i64)),
                Matrix::from_fn(m, k, |row, col| E::from_int(((row * k + col + 1) % 2) as i64)),
            ),
            InputPattern::RandomInt { seed, upper } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                let upper = (*upper).max(1);
                let mut sample =
                    |_: usize, _: usize| E::from_int(rng.random_range(0..upper) as i64);

                let lhs = Matrix::from_fn(n, m, &mut sample);
                let rhs = Matrix::from_fn(m, k, &mut sample);
                (lhs, rhs)
            }
        }
    }

    /// Exact product of the operands generated by [generate](InputPattern::generate).
    ///
    /// With even `M` and `K`, every row of the checkerboard product is `((col + 1) % 2) · M/2`.
    pub fn expected<E: CubeElement>(
        &self,
        problem: &MatmulProblem,
        lhs: &Matrix<E>,
        rhs: &Matrix<E>,
    ) -> Result<Matrix<E>, MatmulSetupError> {
        match self {
            InputPattern::Checkerboard if problem.m % 2 == 0 && problem.k % 2 == 0 => {
                let half = (problem.m / 2) as i64;
                Ok(Matrix::from_fn(problem.n, problem.k, |_, col| {
                    E::from_int(((col + 1) % 2) as i64 * half)
                }))
            }
            _ => Ok(reference::matmul_cpu(lhs, rhs)?),
        }
    }
}

/// One timed strategy run.
#[derive(new, Clone, Copy, Debug)]
pub struct MatmulBenchmark {
    pub problem: MatmulProblem,
    pub strategy: Strategy,
    pub pattern: InputPattern,
}

/// Result of a [MatmulBenchmark].
#[derive(Clone, Debug)]
pub struct BenchmarkReport<E> {
    /// From the copy of the operands to the device until the output is back on the host.
    pub wall: Duration,
    /// Kernel execution only.
    pub kernel: Duration,
    pub check: MatmulCheck<E>,
}

impl MatmulBenchmark {
    /// Generate the operands, multiply them on the device of `client` and check the output.
    pub fn run<R: Runtime, E: CubeElement>(
        &self,
        client: &ComputeClient<R::Server>,
    ) -> Result<BenchmarkReport<E>, MatmulSetupError> {
        self.strategy.validate(&self.problem)?;

        let (lhs, rhs) = self.pattern.generate::<E>(&self.problem);
        let expected = self.pattern.expected(&self.problem, &lhs, &rhs)?;

        let start = Instant::now();
        let lhs = MatrixHandle::from_host(client, &lhs)?;
        let rhs = MatrixHandle::from_host(client, &rhs)?;
        let out = MatrixHandle::empty(client, self.problem.n, self.problem.k)?;
        let stats = launch_ref::<R, E>(client, &self.strategy, &lhs, &rhs, &out)?;
        let out = out.to_host(client)?;
        let wall = start.elapsed();

        log::info!(
            "{} on {}: {} cubes, {} teams, {} syncs",
            self.strategy,
            self.problem,
            stats.cubes,
            stats.teams,
            stats.syncs
        );

        Ok(BenchmarkReport {
            wall,
            kernel: stats.duration,
            check: reference::compare(&out, &expected, E::zero())?,
        })
    }
}

impl<E: Display> Display for BenchmarkReport<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}, {}",
            self.wall.as_millis(),
            self.kernel.as_nanos() as f64 / 1.0e3
        )?;

        if let MatmulCheck::Mismatch { .. } = self.check {
            write!(f, "\nError: {}", self.check)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_closed_form_matches_the_reference() {
        let problem = MatmulProblem::new(3, 6, 4);
        let pattern = InputPattern::Checkerboard;
        let (lhs, rhs) = pattern.generate::<f32>(&problem);

        let expected = pattern.expected(&problem, &lhs, &rhs).unwrap();

        assert_eq!(expected, reference::matmul_cpu(&lhs, &rhs).unwrap());
        assert_eq!(expected.get(2, 0), Some(3.0));
        assert_eq!(expected.get(2, 1), Some(0.0));
    }

    #[test]
    fn random_inputs_are_reproducible() {
        let problem = MatmulProblem::new(4, 4, 4);
        let pattern = InputPattern::RandomInt { seed: 7, upper: 5 };

        let (a, _) = pattern.generate::<f64>(&problem);
        let (b, _) = pattern.generate::<f64>(&problem);

        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|v| (0.0..5.0).contains(v) && v.fract() == 0.0));
    }

    #[test]
    fn report_shows_the_first_error() {
        let report = BenchmarkReport {
            wall: Duration::from_millis(12),
            kernel: Duration::from_micros(250),
            check: MatmulCheck::Mismatch {
                row: 1,
                col: 2,
                got: 3.0f32,
                expected: 0.0,
            },
        };

        assert_eq!(report.to_string(), "12, 250\nError: (1, 2): got 3");
    }
}
