use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::atomic::{AtomicU64, Ordering},
    thread::Scope,
};

use crate::{
    CubeDim, CubeElement, CubeKernel,
    cube::{BarrierError, BarrierPhase, CubeAbort, CubeBarrier, SharedMemory, UnitContext},
    server::ExecutionError,
};

use super::scheduler::{Dispatch, DispatchState};

type Position = (u32, u32, u32);

/// The threads executing one cube at a time, one thread per unit.
///
/// The shared memories and the barrier are reused from one cube to the next. Unit 0 picks the
/// next cube while every other unit waits at the retire rendezvous.
pub(crate) struct Team<E: CubeElement> {
    barrier: CubeBarrier,
    shared: Vec<SharedMemory<E>>,
    current: AtomicU64,
}

impl<E: CubeElement> Team<E> {
    pub fn new(dim: CubeDim, shared_memories: &[usize]) -> Self {
        Self {
            barrier: CubeBarrier::new(dim.num_elems()),
            shared: shared_memories
                .iter()
                .map(|len| SharedMemory::new(*len))
                .collect(),
            current: AtomicU64::new(0),
        }
    }

    /// Kernel barriers completed by this team.
    pub fn syncs(&self) -> u64 {
        self.barrier.syncs()
    }

    /// Spawn the unit threads of the team in the given scope.
    pub fn start<'scope, 'env, K: CubeKernel<E>>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        index: usize,
        dispatch: &'env Dispatch<'env, E, K>,
        state: &'env DispatchState,
    ) {
        for unit_index in 0..dispatch.dim.num_elems() {
            let spawned = std::thread::Builder::new()
                .name(format!("team-{index}-unit-{unit_index}"))
                .spawn_scoped(scope, move || self.run_unit(unit_index, dispatch, state));

            if let Err(err) = spawned {
                state.fail(ExecutionError::Spawn {
                    reason: err.to_string(),
                });
                self.barrier.poison();
                return;
            }
        }
    }

    fn run_unit<K: CubeKernel<E>>(
        &self,
        unit_index: u32,
        dispatch: &Dispatch<'_, E, K>,
        state: &DispatchState,
    ) {
        let total = dispatch.count.num_cubes();
        let unit_pos = dispatch.dim.unit_pos(unit_index);

        loop {
            if unit_index == 0 {
                let cube = state.next_cube(total);
                if cube < total {
                    self.shared.iter().for_each(SharedMemory::invalidate);
                }
                self.current.store(cube, Ordering::Relaxed);
            }

            // The barrier lock orders the store above before every load below.
            if self.barrier.wait(BarrierPhase::Retire).is_err() {
                return;
            }

            let cube = self.current.load(Ordering::Relaxed);
            if cube >= total {
                return;
            }

            let cube_pos = dispatch.count.cube_pos(cube);
            let context = UnitContext::new(
                cube_pos,
                unit_pos,
                dispatch.dim,
                dispatch.count,
                dispatch.inputs,
                dispatch.output,
                &self.shared,
                &self.barrier,
            );

            let outcome = catch_unwind(AssertUnwindSafe(|| dispatch.kernel.execute(&context)));
            if let Err(payload) = outcome {
                self.barrier.poison();
                if let Some(error) = unit_failure(payload, cube_pos, unit_pos) {
                    state.fail(error);
                }
                return;
            }

            if let Err(err) = self.barrier.wait(BarrierPhase::Retire) {
                if let Some(error) = barrier_failure(err, cube_pos, unit_pos) {
                    state.fail(error);
                }
                return;
            }
        }
    }
}

/// Failure to report for a unit that unwound, none when it only followed another unit's failure.
fn unit_failure(
    payload: Box<dyn Any + Send>,
    cube: Position,
    unit: Position,
) -> Option<ExecutionError> {
    match payload.downcast::<CubeAbort>() {
        Ok(abort) => barrier_failure(abort.0, cube, unit),
        Err(payload) => Some(ExecutionError::UnitPanicked {
            cube,
            unit,
            reason: panic_message(payload.as_ref()),
        }),
    }
}

fn barrier_failure(error: BarrierError, cube: Position, unit: Position) -> Option<ExecutionError> {
    match error {
        BarrierError::Poisoned => None,
        BarrierError::Divergent { .. } => Some(ExecutionError::DivergentSync { cube, unit }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
