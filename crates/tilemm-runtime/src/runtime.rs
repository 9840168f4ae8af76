use crate::{
    ComputeRuntime, CpuServer, DeviceProperties, ServerLogger, client::ComputeClient,
    config::GlobalConfig, server::ComputeServer,
};

/// Runtime of a device kind.
pub trait Runtime: Sized + Send + Sync + 'static + core::fmt::Debug {
    /// The compute server used to run kernels.
    type Server: ComputeServer;
    /// The device used to retrieve the compute client.
    type Device: Default + Clone + core::hash::Hash + Eq + core::fmt::Debug + Send + Sync;

    /// Retrieve the compute client from the runtime device.
    fn client(device: &Self::Device) -> ComputeClient<Self::Server>;

    /// The runtime name.
    fn name() -> &'static str;
}

/// A simulated accelerator running on the host threads.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct CpuDevice;

/// Runtime executing kernels on the [CpuServer].
#[derive(Debug)]
pub struct CpuRuntime;

static RUNTIME: ComputeRuntime<CpuDevice, CpuServer> = ComputeRuntime::new();

impl CpuRuntime {
    /// Create a client for a new device with the given limits, independent of the global one.
    pub fn client_with_properties(properties: DeviceProperties) -> ComputeClient<CpuServer> {
        ComputeClient::new(CpuServer::new(properties, ServerLogger::new()))
    }
}

impl Runtime for CpuRuntime {
    type Server = CpuServer;
    type Device = CpuDevice;

    fn client(device: &Self::Device) -> ComputeClient<Self::Server> {
        RUNTIME.client(device, || {
            let config = GlobalConfig::get();
            Self::client_with_properties(DeviceProperties::from_config(&config.compute))
        })
    }

    fn name() -> &'static str {
        "cpu"
    }
}
