/// Limits and parallelism of the simulated device.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ComputeConfig {
    /// Number of cubes executed concurrently, defaults to the available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Upper bound on the number of unit threads alive during a dispatch.
    #[serde(default = "max_threads_default")]
    pub max_threads: usize,

    /// Maximum number of units in a cube.
    #[serde(default = "max_units_per_cube_default")]
    pub max_units_per_cube: u32,

    /// Maximum shared memory per cube, in bytes.
    #[serde(default = "max_shared_memory_size_default")]
    pub max_shared_memory_size: usize,

    /// Device memory size, in bytes.
    #[serde(default = "max_memory_size_default")]
    pub max_memory_size: usize,

    /// Maximum number of cubes along each axis of a dispatch.
    #[serde(default = "max_cube_count_default")]
    pub max_cube_count: u32,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            workers: None,
            max_threads: max_threads_default(),
            max_units_per_cube: max_units_per_cube_default(),
            max_shared_memory_size: max_shared_memory_size_default(),
            max_memory_size: max_memory_size_default(),
            max_cube_count: max_cube_count_default(),
        }
    }
}

impl ComputeConfig {
    /// Number of workers, resolving the default against the host.
    pub fn num_workers(&self) -> usize {
        match self.workers {
            Some(workers) => workers.max(1),
            None => std::thread::available_parallelism()
                .map(|count| count.get())
                .unwrap_or(1),
        }
    }
}

fn max_threads_default() -> usize {
    4096
}

fn max_units_per_cube_default() -> u32 {
    1024
}

fn max_shared_memory_size_default() -> usize {
    48 * 1024
}

fn max_memory_size_default() -> usize {
    4 * 1024 * 1024 * 1024
}

fn max_cube_count_default() -> u32 {
    u16::MAX as u32
}
