use core::time::Duration;
use std::time::Instant;

use crate::{
    CubeDim, CubeElement, CubeKernel, DeviceProperties, KernelTimestamps, ServerLogger,
    cube::GlobalOutput,
    server::{
        Bindings, ComputeServer, CubeCount, ExecutionError, ExecutionStats, Handle, IoError,
        LaunchError, ProfileError, ResourceLimitError,
    },
    storage::{BytesStorage, MemoryUsage},
};

use super::scheduler::{Dispatch, Scheduler};

/// Server of the simulated accelerator, executing kernels on host threads.
#[derive(Debug)]
pub struct CpuServer {
    storage: BytesStorage,
    scheduler: Scheduler,
    properties: DeviceProperties,
    timestamps: KernelTimestamps,
    logger: ServerLogger,
}

impl CpuServer {
    /// Create a server with the given limits.
    pub fn new(properties: DeviceProperties, logger: ServerLogger) -> Self {
        Self {
            storage: BytesStorage::new(properties.max_memory_size),
            scheduler: Scheduler::new(properties.num_workers, properties.max_threads),
            properties,
            timestamps: KernelTimestamps::default(),
            logger,
        }
    }

    fn validate<E: CubeElement>(
        &self,
        shared_memories: &[usize],
        count: CubeCount,
        dim: CubeDim,
        bindings: &Bindings,
    ) -> Result<(), LaunchError> {
        let props = &self.properties;

        let units = dim.checked_num_elems().unwrap_or(u32::MAX);
        if units == 0 || units > props.max_units_per_cube {
            return Err(ResourceLimitError::Units {
                requested: dim,
                max: props.max_units_per_cube,
            }
            .into());
        }

        let shared_bytes = shared_memories.iter().sum::<usize>() * size_of::<E>();
        if shared_bytes > props.max_shared_memory_size {
            return Err(ResourceLimitError::SharedMemory {
                requested: shared_bytes,
                max: props.max_shared_memory_size,
            }
            .into());
        }

        let axes = [count.x, count.y, count.z];
        if axes.iter().any(|axis| *axis == 0 || *axis > props.max_cube_count) {
            return Err(ResourceLimitError::CubeCount {
                requested: count,
                max: props.max_cube_count,
            }
            .into());
        }

        for handle in bindings.inputs.iter().chain([&bindings.output]) {
            if handle.size() % size_of::<E>() != 0 {
                return Err(LaunchError::InvalidBinding {
                    reason: format!(
                        "buffer {} of {} bytes doesn't hold a whole number of {}",
                        handle.id(),
                        handle.size(),
                        E::type_name()
                    ),
                });
            }
        }

        if bindings.inputs.contains(&bindings.output) {
            return Err(LaunchError::InvalidBinding {
                reason: format!(
                    "output buffer {} is also bound as an input",
                    bindings.output.id()
                ),
            });
        }

        Ok(())
    }
}

impl ComputeServer for CpuServer {
    fn create(&mut self, data: &[u8]) -> Result<Handle, IoError> {
        let handle = self.storage.alloc(data.len())?;
        self.storage.bytes_mut(&handle)?.copy_from_slice(data);
        Ok(handle)
    }

    fn empty(&mut self, size: usize) -> Result<Handle, IoError> {
        self.storage.alloc(size)
    }

    fn read(&mut self, handle: &Handle) -> Result<Vec<u8>, IoError> {
        self.storage.bytes(handle).map(|bytes| bytes.to_vec())
    }

    fn execute<E: CubeElement, K: CubeKernel<E>>(
        &mut self,
        kernel: &K,
        count: CubeCount,
        dim: CubeDim,
        bindings: Bindings,
    ) -> Result<ExecutionStats, LaunchError> {
        let id = kernel.id();
        let shared_memories = kernel.shared_memories();

        self.validate::<E>(&shared_memories, count, dim, &bindings)?;
        self.logger
            .log_launch(&id, || format!("cube_count={count} cube_dim={dim}"));

        let inputs = bindings
            .inputs
            .iter()
            .map(|handle| self.storage.bytes(handle).map(E::from_bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let output = GlobalOutput::from_slice(E::from_bytes(self.storage.bytes(&bindings.output)?));

        let start = Instant::now();
        let result = self.scheduler.execute(Dispatch {
            kernel,
            count,
            dim,
            inputs: &inputs,
            output: &output,
            shared_memories: &shared_memories,
        });
        let duration = start.elapsed();

        let failure = |source| LaunchError::Execution {
            kernel: id.to_string(),
            source,
        };
        let report = result.map_err(failure)?;
        if let Some(index) = output.first_overlap() {
            return Err(failure(ExecutionError::OverlappingWrite { index }));
        }

        let values = output.to_vec();
        self.storage
            .bytes_mut(&bindings.output)?
            .copy_from_slice(E::as_bytes(&values));

        self.timestamps.record(duration);
        self.logger.register_profiled(&id, duration);

        Ok(ExecutionStats {
            cubes: count.num_cubes(),
            units_per_cube: dim.num_elems(),
            teams: report.teams,
            syncs: report.syncs,
            written: output.num_written(),
            duration,
        })
    }

    fn enable_timestamps(&mut self) {
        self.timestamps.enable();
    }

    fn disable_timestamps(&mut self) {
        self.timestamps.disable();
        self.logger.profile_summary();
    }

    fn sync_elapsed(&mut self) -> Result<Duration, ProfileError> {
        self.timestamps.take()
    }

    fn memory_usage(&self) -> MemoryUsage {
        self.storage.usage()
    }

    fn memory_cleanup(&mut self) {
        self.storage.cleanup();
    }

    fn properties(&self) -> &DeviceProperties {
        &self.properties
    }
}
