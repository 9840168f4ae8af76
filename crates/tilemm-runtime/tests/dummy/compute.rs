use tilemm_runtime::client::ComputeClient;
use tilemm_runtime::{ComputeRuntime, CpuServer, DeviceProperties, ServerLogger};

/// The dummy device, the number of workers executing cubes concurrently.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct DummyDevice {
    pub workers: usize,
}

pub type DummyClient = ComputeClient<CpuServer>;

static RUNTIME: ComputeRuntime<DummyDevice, CpuServer> = ComputeRuntime::new();

pub fn properties(workers: usize) -> DeviceProperties {
    DeviceProperties {
        max_units_per_cube: 256,
        max_shared_memory_size: 4096,
        max_cube_count: 1024,
        max_memory_size: 1024 * 1024,
        num_workers: workers,
        max_threads: 1024,
    }
}

pub fn init_client(device: &DummyDevice) -> DummyClient {
    ComputeClient::new(CpuServer::new(properties(device.workers), ServerLogger::new()))
}

pub fn test_client(device: &DummyDevice) -> DummyClient {
    RUNTIME.client(device, || init_client(device))
}
