mod dummy;

use crate::dummy::{DummyDevice, DummyElementwiseAddition, init_client, properties, test_client};

use dummy::*;
use pretty_assertions::assert_eq;
use tilemm_runtime::server::{
    Bindings, CubeCount, ExecutionError, IoError, LaunchError, ResourceLimitError,
};
use tilemm_runtime::{CpuRuntime, CubeDim};

#[test_log::test]
fn created_resource_is_the_same_when_read() {
    let client = test_client(&DummyDevice { workers: 1 });
    let resource = vec![0.0f32, 1.0, 2.0];
    let handle = client.create_from_slice(&resource).unwrap();

    let obtained_resource = client.read_elems::<f32>(&handle).unwrap();

    assert_eq!(resource, obtained_resource)
}

#[test_log::test]
fn empty_allocates_memory() {
    let client = test_client(&DummyDevice { workers: 1 });
    let handle = client.empty(4).unwrap();

    assert_eq!(client.read_one(&handle).unwrap(), vec![0u8; 4]);
}

#[test_log::test]
fn execute_elementwise_addition() {
    let client = test_client(&DummyDevice { workers: 2 });
    let lhs = client.create_from_slice(&[0.0f32, 1.0, 2.0]).unwrap();
    let rhs = client.create_from_slice(&[4.0f32, 4.0, 4.0]).unwrap();
    let out = client.empty(3 * size_of::<f32>()).unwrap();

    let stats = client
        .launch::<f32, _>(
            &DummyElementwiseAddition,
            CubeCount::new_2d(2, 1),
            CubeDim::new_2d(2, 1),
            Bindings::new(out.clone()).with_inputs([lhs, rhs]),
        )
        .unwrap();

    assert_eq!(client.read_elems::<f32>(&out).unwrap(), vec![4.0, 5.0, 6.0]);
    assert_eq!(stats.cubes, 2);
    assert_eq!(stats.written, 3);
    assert_eq!(stats.teams, 2);
}

#[test_log::test]
fn cube_barriers_are_reused_across_cubes() {
    let client = test_client(&DummyDevice { workers: 3 });
    let units = 8;
    let cubes = 10;
    let input: Vec<f64> = (0..units * cubes).map(|i| i as f64).collect();
    let input = client.create_from_slice(&input).unwrap();
    let out = client.empty(cubes * size_of::<f64>()).unwrap();

    let stats = client
        .launch::<f64, _>(
            &CubeSum { units },
            CubeCount::new_2d(cubes as u32, 1),
            CubeDim::new_2d(units as u32, 1),
            Bindings::new(out.clone()).with_inputs([input]),
        )
        .unwrap();

    let expected: Vec<f64> = (0..cubes)
        .map(|cube| (0..units).map(|i| (cube * units + i) as f64).sum())
        .collect();
    assert_eq!(client.read_elems::<f64>(&out).unwrap(), expected);
    // One sync after staging, then one per reduction step.
    assert_eq!(stats.syncs, cubes as u64 * 4);
}

#[test_log::test]
fn shared_memory_starts_invalid_for_every_cube() {
    let client = test_client(&DummyDevice { workers: 1 });
    let out = client.empty(3 * size_of::<f32>()).unwrap();

    client
        .launch::<f32, _>(
            &StaleShared,
            CubeCount::new_2d(3, 1),
            CubeDim::new_2d(2, 1),
            Bindings::new(out.clone()),
        )
        .unwrap();

    let values = client.read_elems::<f32>(&out).unwrap();
    assert_eq!(values[0], 1.0);
    assert!(values[1].is_nan());
    assert!(values[2].is_nan());
}

#[test_log::test]
fn panicking_unit_is_reported_and_output_untouched() {
    let client = test_client(&DummyDevice { workers: 2 });
    let out = client.empty(16 * size_of::<f32>()).unwrap();

    let result = client.launch::<f32, _>(
        &PanicAt { absolute: 9 },
        CubeCount::new_2d(4, 1),
        CubeDim::new_2d(4, 1),
        Bindings::new(out.clone()),
    );

    match result {
        Err(LaunchError::Execution {
            kernel,
            source: ExecutionError::UnitPanicked { cube, unit, reason },
        }) => {
            assert_eq!(kernel, "panic_at<9>");
            assert_eq!(cube, (2, 0, 0));
            assert_eq!(unit, (1, 0, 0));
            assert_eq!(reason, "unit 9 failed");
        }
        other => panic!("Expected a unit panic, got {other:?}"),
    }
    assert_eq!(client.read_elems::<f32>(&out).unwrap(), vec![0.0; 16]);
}

#[test_log::test]
fn divergent_barrier_is_detected() {
    let client = test_client(&DummyDevice { workers: 1 });
    let out = client.empty(size_of::<f32>()).unwrap();

    let result = client.launch::<f32, _>(
        &DivergentSync,
        CubeCount::new_2d(1, 1),
        CubeDim::new_2d(4, 1),
        Bindings::new(out),
    );

    assert!(matches!(
        result,
        Err(LaunchError::Execution {
            source: ExecutionError::DivergentSync { cube: (0, 0, 0), .. },
            ..
        })
    ));
}

#[test_log::test]
fn overlapping_writes_are_rejected() {
    let client = test_client(&DummyDevice { workers: 2 });
    let out = client.empty(2 * size_of::<f32>()).unwrap();

    let result = client.launch::<f32, _>(
        &SameCell,
        CubeCount::new_2d(2, 1),
        CubeDim::new_2d(2, 1),
        Bindings::new(out.clone()),
    );

    assert!(matches!(
        result,
        Err(LaunchError::Execution {
            source: ExecutionError::OverlappingWrite { index: 0 },
            ..
        })
    ));
    assert_eq!(client.read_elems::<f32>(&out).unwrap(), vec![0.0; 2]);
}

#[test_log::test]
fn resource_limits_are_checked_before_execution() {
    let client = test_client(&DummyDevice { workers: 1 });
    let out = client.empty(4 * size_of::<f32>()).unwrap();
    let bindings = || Bindings::new(out.clone());

    let result = client.launch::<f32, _>(
        &HugeShared,
        CubeCount::new_2d(1, 1),
        CubeDim::new_2d(1, 1),
        bindings(),
    );
    assert_eq!(
        result,
        Err(LaunchError::TooManyResources(ResourceLimitError::SharedMemory {
            requested: 4 << 20,
            max: 4096,
        }))
    );

    let result = client.launch::<f32, _>(
        &SameCell,
        CubeCount::new_2d(1, 1),
        CubeDim::new_2d(32, 16),
        bindings(),
    );
    assert!(matches!(
        result,
        Err(LaunchError::TooManyResources(ResourceLimitError::Units { max: 256, .. }))
    ));

    // The unit count of this dim wraps to 2 in u32 arithmetic.
    let overflowing = CubeDim::new_2d((1 << 31) + 1, 2);
    let result =
        client.launch::<f32, _>(&SameCell, CubeCount::new_2d(1, 1), overflowing, bindings());
    assert_eq!(
        result,
        Err(LaunchError::TooManyResources(ResourceLimitError::Units {
            requested: overflowing,
            max: 256,
        }))
    );

    let result = client.launch::<f32, _>(
        &SameCell,
        CubeCount::new_2d(0, 1),
        CubeDim::new_2d(1, 1),
        bindings(),
    );
    assert!(matches!(
        result,
        Err(LaunchError::TooManyResources(ResourceLimitError::CubeCount { .. }))
    ));
}

#[test_log::test]
fn invalid_bindings_are_rejected() {
    let client = test_client(&DummyDevice { workers: 1 });
    let out = client.empty(4 * size_of::<f32>()).unwrap();
    let odd = client.empty(6).unwrap();

    let aliased = client.launch::<f32, _>(
        &DummyElementwiseAddition,
        CubeCount::new_2d(1, 1),
        CubeDim::new_2d(4, 1),
        Bindings::new(out.clone()).with_inputs([out.clone(), out.clone()]),
    );
    assert!(matches!(aliased, Err(LaunchError::InvalidBinding { .. })));

    let misaligned = client.launch::<f32, _>(
        &SameCell,
        CubeCount::new_2d(1, 1),
        CubeDim::new_2d(1, 1),
        Bindings::new(odd),
    );
    assert!(matches!(misaligned, Err(LaunchError::InvalidBinding { .. })));
}

#[test_log::test]
fn memory_is_reclaimed_once_handles_are_dropped() {
    let mut props = properties(1);
    props.max_memory_size = 64;
    let client = CpuRuntime::client_with_properties(props);

    let first = client.empty(48).unwrap();
    assert!(matches!(client.empty(32), Err(IoError::OutOfMemory { .. })));

    core::mem::drop(first);
    let second = client.empty(32).unwrap();

    assert_eq!(second.size(), 32);
    assert_eq!(client.memory_usage().bytes_in_use, 32);

    core::mem::drop(second);
    client.memory_cleanup();
    assert_eq!(client.memory_usage().number_allocs, 0);
}

#[test_log::test]
fn profile_measures_kernel_time() {
    let client = init_client(&DummyDevice { workers: 2 });
    let lhs = client.create_from_slice(&[1.0f32; 64]).unwrap();
    let rhs = client.create_from_slice(&[2.0f32; 64]).unwrap();
    let out = client.empty(64 * size_of::<f32>()).unwrap();

    let (stats, elapsed) = client
        .profile(|| {
            client.launch::<f32, _>(
                &DummyElementwiseAddition,
                CubeCount::new_2d(4, 1),
                CubeDim::new_2d(16, 1),
                Bindings::new(out.clone()).with_inputs([lhs.clone(), rhs.clone()]),
            )
        })
        .unwrap();

    assert_eq!(elapsed, stats.unwrap().duration);
    assert!(client.sync_elapsed().is_err());
}
