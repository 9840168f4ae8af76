use core::time::Duration;

use crate::server::ProfileError;

#[derive(Debug, Default)]
/// Keeps track of the time spent executing kernels while timestamps are enabled.
pub struct KernelTimestamps {
    state: Option<Duration>,
}

impl KernelTimestamps {
    /// Start recording.
    pub fn enable(&mut self) {
        if self.state.is_none() {
            self.state = Some(Duration::ZERO);
        }
    }

    /// Stop recording, dropping what was accumulated.
    pub fn disable(&mut self) {
        self.state = None;
    }

    /// Whether execution times are recorded.
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// Add the duration of one kernel execution. Ignored when disabled.
    pub fn record(&mut self, duration: Duration) {
        if let Some(total) = &mut self.state {
            *total += duration;
        }
    }

    /// Accumulated time since the last call, the counter restarts from zero.
    pub fn take(&mut self) -> Result<Duration, ProfileError> {
        match &mut self.state {
            Some(total) => Ok(core::mem::take(total)),
            None => Err(ProfileError::NotRegistered),
        }
    }
}
