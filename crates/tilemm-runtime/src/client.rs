use crate::{
    CubeDim, CubeElement, CubeKernel, DeviceProperties,
    server::{
        Bindings, ComputeServer, CubeCount, ExecutionStats, Handle, IoError, LaunchError,
        ProfileError,
    },
    storage::MemoryUsage,
};
use core::time::Duration;
use std::sync::Arc;

/// The ComputeClient is the entry point to require tasks from the ComputeServer.
/// It should be obtained for a specific device via the [Runtime](crate::Runtime).
///
/// Clones share the same server. Every call locks the server for its whole duration, so two
/// launches never overlap on the same device.
#[derive(Debug)]
pub struct ComputeClient<Server: ComputeServer> {
    server: Arc<spin::Mutex<Server>>,
    properties: Arc<DeviceProperties>,
}

impl<S: ComputeServer> Clone for ComputeClient<S> {
    fn clone(&self) -> Self {
        Self {
            server: self.server.clone(),
            properties: self.properties.clone(),
        }
    }
}

impl<Server: ComputeServer> ComputeClient<Server> {
    /// Create a new client owning the given server.
    pub fn new(server: Server) -> Self {
        let properties = Arc::new(server.properties().clone());

        Self {
            server: Arc::new(spin::Mutex::new(server)),
            properties,
        }
    }

    /// Given a handle, returns the owned resource as bytes.
    pub fn read_one(&self, handle: &Handle) -> Result<Vec<u8>, IoError> {
        self.server.lock().read(handle)
    }

    /// Given a handle, returns the owned resource as elements.
    pub fn read_elems<E: CubeElement>(&self, handle: &Handle) -> Result<Vec<E>, IoError> {
        let bytes = self.read_one(handle)?;
        Ok(bytes
            .chunks_exact(size_of::<E>())
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    /// Given a resource, stores it and returns the resource handle.
    pub fn create(&self, data: &[u8]) -> Result<Handle, IoError> {
        self.server.lock().create(data)
    }

    /// Given elements, stores them and returns the resource handle.
    pub fn create_from_slice<E: CubeElement>(&self, data: &[E]) -> Result<Handle, IoError> {
        self.create(E::as_bytes(data))
    }

    /// Reserves `size` zeroed bytes in the storage, and returns a handle over them.
    pub fn empty(&self, size: usize) -> Result<Handle, IoError> {
        self.server.lock().empty(size)
    }

    /// Executes the `kernel` over the given `bindings`.
    pub fn launch<E: CubeElement, K: CubeKernel<E>>(
        &self,
        kernel: &K,
        count: CubeCount,
        dim: CubeDim,
        bindings: Bindings,
    ) -> Result<ExecutionStats, LaunchError> {
        self.server.lock().execute(kernel, count, dim, bindings)
    }

    /// Enable timestamp collection on the server for performance profiling.
    pub fn enable_timestamps(&self) {
        self.server.lock().enable_timestamps();
    }

    /// Disable timestamp collection on the server.
    pub fn disable_timestamps(&self) {
        self.server.lock().disable_timestamps();
    }

    /// Kernel execution time accumulated since the last call.
    pub fn sync_elapsed(&self) -> Result<Duration, ProfileError> {
        self.server.lock().sync_elapsed()
    }

    /// Measure the kernel execution time of everything launched by `func`.
    pub fn profile<O>(&self, func: impl FnOnce() -> O) -> Result<(O, Duration), ProfileError> {
        self.enable_timestamps();
        // Drop what was accumulated before.
        self.sync_elapsed()?;

        let out = func();
        let elapsed = self.sync_elapsed();
        self.disable_timestamps();

        Ok((out, elapsed?))
    }

    /// Get the features supported by the compute server.
    pub fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    /// Get the current memory usage of this client.
    pub fn memory_usage(&self) -> MemoryUsage {
        self.server.lock().memory_usage()
    }

    /// Ask the client to release memory that it can release.
    pub fn memory_cleanup(&self) {
        self.server.lock().memory_cleanup();
    }
}
