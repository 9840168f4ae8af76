//! Test suite shared by every runtime, instantiated with [testgen_matmul](crate::testgen_matmul).

pub mod scenarios;
pub mod test_utils;

#[allow(missing_docs)]
#[macro_export]
macro_rules! testgen_matmul {
    () => {
        $crate::testgen_matmul!(matmul_f32, f32);
        $crate::testgen_matmul!(matmul_f64, f64);

        mod matmul_partition {
            #[test_log::test]
            fn partition_is_complete() {
                $crate::tests::scenarios::test_partition_is_complete();
            }
        }
    };
    ($name:ident, $float:ty) => {
        mod $name {
            use super::*;

            type Server = <TestRuntime as tilemm_runtime::Runtime>::Server;
            type Client = tilemm_runtime::client::ComputeClient<Server>;

            fn client() -> Client {
                <TestRuntime as tilemm_runtime::Runtime>::client(&Default::default())
            }

            #[test_log::test]
            fn single_tile_of_ones() {
                $crate::tests::scenarios::test_single_tile_of_ones::<TestRuntime, $float>(client());
            }

            #[test_log::test]
            fn checkerboard_two_steps() {
                $crate::tests::scenarios::test_checkerboard_two_steps::<TestRuntime, $float>(
                    client(),
                );
            }

            #[test_log::test]
            fn coarsened_random_integers() {
                $crate::tests::scenarios::test_coarsened_random_integers::<TestRuntime, $float>(
                    client(),
                );
            }

            #[test_log::test]
            fn all_strategies_match_reference() {
                use $crate::tests::scenarios::test_all_strategies_match_reference;

                test_all_strategies_match_reference::<TestRuntime, $float>(client());
            }

            #[test_log::test]
            fn checkerboard_benchmark() {
                $crate::tests::scenarios::test_checkerboard_benchmark::<TestRuntime, $float>(
                    client(),
                );
            }

            #[test_log::test]
            fn unaligned_problem_is_rejected() {
                $crate::tests::scenarios::test_unaligned_problem_is_rejected::<TestRuntime, $float>(
                    client(),
                );
            }

            #[test_log::test]
            fn repeated_launches_are_identical() {
                $crate::tests::scenarios::test_repeated_launches_are_identical::<
                    TestRuntime,
                    $float,
                >(client());
            }

            #[test_log::test]
            fn naive_partial_cubes() {
                $crate::tests::naive::test_partial_cubes::<TestRuntime, $float>(client());
            }

            #[test_log::test]
            fn naive_coarsened() {
                $crate::tests::naive::test_coarsened::<TestRuntime, $float>(client());
            }

            #[test_log::test]
            fn naive_single_unit() {
                $crate::tests::naive::test_single_unit::<TestRuntime, $float>(client());
            }

            #[test_log::test]
            fn tiled_rectangular() {
                $crate::tests::tiled::test_rectangular::<TestRuntime, $float>(client());
            }

            #[test_log::test]
            fn tiled_coarsened() {
                $crate::tests::tiled::test_coarsened::<TestRuntime, $float>(client());
            }

            #[test_log::test]
            fn tiled_single_tile() {
                $crate::tests::tiled::test_single_tile::<TestRuntime, $float>(client());
            }

            #[test_log::test]
            fn unroll_is_transparent() {
                $crate::tests::tiled::test_unroll_is_transparent::<TestRuntime, $float>(client());
            }
        }
    };
}
