use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Which rendezvous a unit is arriving at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierPhase {
    /// A barrier requested by the kernel itself.
    Sync,
    /// The scheduler's rendezvous between two cubes executed by the same team.
    Retire,
}

/// Reasons a unit can't pass a [CubeBarrier].
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum BarrierError {
    /// Another unit of the cube failed and the barrier won't be completed.
    #[error("The cube barrier was poisoned by another unit")]
    Poisoned,
    /// Units of the same cube reached different barriers.
    #[error("Units of the same cube reached different barriers: {expected:?} and {found:?}")]
    Divergent {
        /// Phase of the units already waiting.
        expected: BarrierPhase,
        /// Phase of the unit that arrived last.
        found: BarrierPhase,
    },
}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: u32,
    generation: u64,
    phase: Option<BarrierPhase>,
    syncs: u64,
    poisoned: bool,
}

/// Counting barrier shared by all units of a cube.
///
/// No unit passes [wait](CubeBarrier::wait) until every unit of the cube arrived with the same
/// phase. Completing the barrier advances its generation, which is what waiters watch for, so the
/// same barrier can be reused for every rendezvous of a cube. Poisoning wakes every waiter with an
/// error instead of leaving them blocked forever.
#[derive(Debug)]
pub struct CubeBarrier {
    num_units: u32,
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

impl CubeBarrier {
    /// Create a barrier for the given number of units.
    pub fn new(num_units: u32) -> Self {
        Self {
            num_units: num_units.max(1),
            state: Mutex::new(BarrierState::default()),
            condvar: Condvar::new(),
        }
    }

    /// Number of units taking part in every rendezvous.
    pub fn num_units(&self) -> u32 {
        self.num_units
    }

    /// Block until every unit arrived, or until the barrier is poisoned.
    pub fn wait(&self, phase: BarrierPhase) -> Result<(), BarrierError> {
        let mut state = self.lock();

        if state.poisoned {
            return Err(BarrierError::Poisoned);
        }

        match state.phase {
            None => state.phase = Some(phase),
            Some(expected) if expected != phase => {
                state.poisoned = true;
                self.condvar.notify_all();
                return Err(BarrierError::Divergent {
                    expected,
                    found: phase,
                });
            }
            Some(_) => {}
        }

        state.arrived += 1;

        if state.arrived == self.num_units {
            state.arrived = 0;
            state.generation += 1;
            state.phase = None;
            if phase == BarrierPhase::Sync {
                state.syncs += 1;
            }
            self.condvar.notify_all();
            return Ok(());
        }

        let generation = state.generation;
        while state.generation == generation && !state.poisoned {
            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.generation != generation {
            Ok(())
        } else {
            Err(BarrierError::Poisoned)
        }
    }

    /// Wake every waiter with [BarrierError::Poisoned]. Poisoning can't be undone.
    pub fn poison(&self) {
        let mut state = self.lock();
        state.poisoned = true;
        self.condvar.notify_all();
    }

    /// Whether the barrier was poisoned.
    pub fn is_poisoned(&self) -> bool {
        self.lock().poisoned
    }

    /// Number of completed [BarrierPhase::Sync] rendezvous.
    pub fn syncs(&self) -> u64 {
        self.lock().syncs
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
