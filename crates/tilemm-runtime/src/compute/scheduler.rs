use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use crate::{
    CubeDim, CubeElement, CubeKernel,
    cube::GlobalOutput,
    server::{CubeCount, ExecutionError},
};

use super::team::Team;

/// Everything a dispatch needs, borrowed for the duration of the execution.
pub(crate) struct Dispatch<'a, E: CubeElement, K> {
    pub kernel: &'a K,
    pub count: CubeCount,
    pub dim: CubeDim,
    pub inputs: &'a [&'a [E]],
    pub output: &'a GlobalOutput<E>,
    pub shared_memories: &'a [usize],
}

/// What the scheduler observed while executing a dispatch.
#[derive(Debug, Default)]
pub(crate) struct DispatchReport {
    pub teams: usize,
    pub syncs: u64,
}

/// State shared by every team of a dispatch.
pub(crate) struct DispatchState {
    next_cube: AtomicU64,
    abort: AtomicBool,
    failure: Mutex<Option<ExecutionError>>,
}

impl DispatchState {
    fn new() -> Self {
        Self {
            next_cube: AtomicU64::new(0),
            abort: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    /// Linear index of the next cube to execute, once the dispatch is aborted no cube is handed
    /// out anymore.
    pub fn next_cube(&self, total: u64) -> u64 {
        if self.abort.load(Ordering::Relaxed) {
            return total;
        }
        self.next_cube.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a failure and stop handing out cubes. Only the first failure is kept.
    pub fn fail(&self, error: ExecutionError) {
        self.abort.store(true, Ordering::Relaxed);

        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            log::debug!("Aborting dispatch: {error}");
            *failure = Some(error);
        }
    }

    fn into_failure(self) -> Option<ExecutionError> {
        self.failure
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs the cubes of a dispatch on teams of unit threads.
///
/// A team has one thread per unit of a cube and executes one cube at a time, pulling cube indices
/// from a counter shared with the other teams until the grid is exhausted.
#[derive(Debug, Clone)]
pub(crate) struct Scheduler {
    num_workers: usize,
    max_threads: usize,
}

impl Scheduler {
    pub fn new(num_workers: usize, max_threads: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
            max_threads,
        }
    }

    /// Number of teams used to execute `num_cubes` cubes of `units` units.
    pub fn num_teams(&self, num_cubes: u64, units: u32) -> usize {
        let by_threads = self.max_threads / units.max(1) as usize;
        let by_cubes = usize::try_from(num_cubes).unwrap_or(usize::MAX);

        self.num_workers.min(by_cubes).min(by_threads).max(1)
    }

    pub fn execute<E, K>(
        &self,
        dispatch: Dispatch<'_, E, K>,
    ) -> Result<DispatchReport, ExecutionError>
    where
        E: CubeElement,
        K: CubeKernel<E>,
    {
        let num_cubes = dispatch.count.num_cubes();
        let num_teams = self.num_teams(num_cubes, dispatch.dim.num_elems());
        let state = DispatchState::new();

        log::trace!(
            "Executing {num_cubes} cubes of {} units on {num_teams} teams",
            dispatch.dim.num_elems()
        );

        let teams: Vec<Team<E>> = (0..num_teams)
            .map(|_| Team::new(dispatch.dim, dispatch.shared_memories))
            .collect();

        std::thread::scope(|scope| {
            for (index, team) in teams.iter().enumerate() {
                team.start(scope, index, &dispatch, &state);
            }
        });

        match state.into_failure() {
            Some(error) => Err(error),
            None => Ok(DispatchReport {
                teams: num_teams,
                syncs: teams.iter().map(Team::syncs).sum(),
            }),
        }
    }
}
