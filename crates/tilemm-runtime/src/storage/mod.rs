mod bytes_cpu;

pub use bytes_cpu::*;

use core::fmt::Display;

/// Amount of memory in use on a device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Number of live allocations.
    pub number_allocs: u64,
    /// Bytes held by live allocations.
    pub bytes_in_use: u64,
    /// Bytes the device can hold.
    pub bytes_limit: u64,
}

impl Display for MemoryUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} allocations, {} / {} bytes in use",
            self.number_allocs, self.bytes_in_use, self.bytes_limit
        )
    }
}
