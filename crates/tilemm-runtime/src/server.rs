mod handle;

pub use handle::*;

use core::{fmt::Display, time::Duration};

use crate::{CubeDim, CubeElement, CubeKernel, DeviceProperties, storage::MemoryUsage};

/// Number of cubes of a dispatch, along each axis.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CubeCount {
    /// Cubes along x.
    pub x: u32,
    /// Cubes along y.
    pub y: u32,
    /// Cubes along z.
    pub z: u32,
}

impl CubeCount {
    /// Create a new cube count.
    pub const fn new_3d(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Create a new two dimensional cube count.
    pub const fn new_2d(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Total number of cubes.
    pub const fn num_cubes(&self) -> u64 {
        (self.x as u64 * self.y as u64).saturating_mul(self.z as u64)
    }

    /// Cube position from its linear index, x being the slowest axis.
    pub const fn cube_pos(&self, index: u64) -> (u32, u32, u32) {
        let z = index % self.z as u64;
        let y = (index / self.z as u64) % self.y as u64;
        let x = index / (self.z as u64 * self.y as u64);
        (x as u32, y as u32, z as u32)
    }
}

impl Display for CubeCount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Buffers bound to a kernel launch.
#[derive(Clone, Debug)]
pub struct Bindings {
    /// Read-only inputs, in the order the kernel reads them.
    pub inputs: Vec<Handle>,
    /// The output, written by the kernel.
    pub output: Handle,
}

impl Bindings {
    /// Bind the given output with no inputs.
    pub fn new(output: Handle) -> Self {
        Self {
            inputs: Vec::new(),
            output,
        }
    }

    /// Add the given inputs after the already bound ones.
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = Handle>) -> Self {
        self.inputs.extend(inputs);
        self
    }
}

/// Information gathered while executing a dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Number of cubes executed.
    pub cubes: u64,
    /// Number of units per cube.
    pub units_per_cube: u32,
    /// Number of teams that executed cubes concurrently.
    pub teams: usize,
    /// Kernel barriers completed, summed over every cube.
    pub syncs: u64,
    /// Number of distinct output cells written.
    pub written: usize,
    /// Time spent executing the kernel, without allocation and transfers.
    pub duration: Duration,
}

/// The compute server is responsible for handling resources and computations over resources.
///
/// Everything happens synchronously: once a method returns, its effect on device memory is
/// complete.
pub trait ComputeServer: Send + core::fmt::Debug + 'static {
    /// Copy host bytes into a new device allocation.
    fn create(&mut self, data: &[u8]) -> Result<Handle, IoError>;

    /// Reserve a zeroed device allocation of `size` bytes.
    fn empty(&mut self, size: usize) -> Result<Handle, IoError>;

    /// Copy a device allocation back to host bytes.
    fn read(&mut self, handle: &Handle) -> Result<Vec<u8>, IoError>;

    /// Execute the kernel over the whole grid.
    ///
    /// The output binding is only updated when every unit completed successfully.
    fn execute<E: CubeElement, K: CubeKernel<E>>(
        &mut self,
        kernel: &K,
        count: CubeCount,
        dim: CubeDim,
        bindings: Bindings,
    ) -> Result<ExecutionStats, LaunchError>;

    /// Start recording kernel execution time.
    fn enable_timestamps(&mut self);

    /// Stop recording kernel execution time.
    fn disable_timestamps(&mut self);

    /// Kernel execution time accumulated since the last call.
    fn sync_elapsed(&mut self) -> Result<Duration, ProfileError>;

    /// The current memory usage of the server.
    fn memory_usage(&self) -> MemoryUsage;

    /// Reclaim allocations that no handle points to anymore.
    fn memory_cleanup(&mut self);

    /// Limits of the simulated device.
    fn properties(&self) -> &DeviceProperties;
}

/// Errors moving data between the host and the device.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum IoError {
    /// The device doesn't have enough free memory.
    #[error(
        "Out of device memory: {requested} bytes requested while {used} of {max} bytes are in use"
    )]
    OutOfMemory {
        /// Bytes requested.
        requested: usize,
        /// Bytes already in use.
        used: usize,
        /// Device memory size.
        max: usize,
    },
    /// The handle doesn't point to a live allocation of this server.
    #[error("Handle {id} doesn't point to an allocation of this device")]
    InvalidHandle {
        /// Id of the handle.
        id: HandleId,
    },
}

/// Resource limit errors.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ResourceLimitError {
    /// Shared memory exceeds maximum.
    #[error(
        "Too much shared memory requested.\nRequested {requested} bytes, maximum {max} bytes available."
    )]
    SharedMemory {
        /// Value requested.
        requested: usize,
        /// Maximum value.
        max: usize,
    },
    /// Too many units in a cube, or none.
    #[error(
        "Invalid cube dim.\nRequested cube dim {requested}, a cube must have between 1 and {max} units."
    )]
    Units {
        /// Cube dim requested.
        requested: CubeDim,
        /// Maximum number of units.
        max: u32,
    },
    /// Too many cubes along one axis, or an empty dispatch.
    #[error("Invalid cube count.\nRequested {requested}, each axis must be in [1, {max}].")]
    CubeCount {
        /// Cube count requested.
        requested: CubeCount,
        /// Maximum cubes per axis.
        max: u32,
    },
}

/// Failures happening while units execute a kernel.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ExecutionError {
    /// A unit panicked, the whole dispatch is discarded.
    #[error("Unit {unit:?} of cube {cube:?} panicked: {reason}")]
    UnitPanicked {
        /// Position of the failing cube.
        cube: (u32, u32, u32),
        /// Position of the failing unit in its cube.
        unit: (u32, u32, u32),
        /// Panic message.
        reason: String,
    },
    /// Units of the same cube didn't reach the same barrier.
    #[error("Unit {unit:?} of cube {cube:?} reached a barrier the rest of its cube skipped")]
    DivergentSync {
        /// Position of the failing cube.
        cube: (u32, u32, u32),
        /// Position of the unit that detected the divergence.
        unit: (u32, u32, u32),
    },
    /// Two units wrote the same output cell.
    #[error("Output cell {index} was written by more than one unit")]
    OverlappingWrite {
        /// Index of the first cell written twice.
        index: usize,
    },
    /// A unit thread couldn't be started.
    #[error("Unable to start a unit thread: {reason}")]
    Spawn {
        /// Error reported by the operating system.
        reason: String,
    },
}

/// Kernel Launch Errors.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum LaunchError {
    /// Too many resources were requested.
    #[error("Too many resources were requested during launch\n{0}")]
    TooManyResources(#[from] ResourceLimitError),

    /// The bindings don't fit the kernel.
    #[error("Invalid bindings for launch: {reason}")]
    InvalidBinding {
        /// Why the bindings are invalid.
        reason: String,
    },

    /// A binding couldn't be accessed.
    #[error("An io error happened during launch\nCaused by:\n  {0}")]
    Io(#[from] IoError),

    /// The kernel failed while executing.
    #[error("Kernel {kernel} failed during execution\nCaused by:\n  {source}")]
    Execution {
        /// Id of the kernel.
        kernel: String,
        /// The failure.
        source: ExecutionError,
    },
}

/// An error during profiling.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ProfileError {
    /// No profiling was registered.
    #[error("No profiling registered, timestamps must be enabled first")]
    NotRegistered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_pos_is_row_major_over_axes() {
        let count = CubeCount::new_3d(2, 3, 1);
        assert_eq!(count.num_cubes(), 6);
        assert_eq!(count.cube_pos(0), (0, 0, 0));
        assert_eq!(count.cube_pos(2), (0, 2, 0));
        assert_eq!(count.cube_pos(3), (1, 0, 0));
        assert_eq!(count.cube_pos(5), (1, 2, 0));
    }

    #[test]
    fn errors_name_the_offending_values() {
        let err = LaunchError::from(ResourceLimitError::SharedMemory {
            requested: 65536,
            max: 49152,
        });
        let message = err.to_string();
        assert!(message.contains("65536"));
        assert!(message.contains("49152"));
    }
}
