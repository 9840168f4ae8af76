use crate::{client::ComputeClient, config::compute::ComputeConfig, server::ComputeServer};
use core::ops::DerefMut;
use hashbrown::HashMap;

/// Limits of a simulated device, checked before every launch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceProperties {
    /// Maximum number of units in a cube.
    pub max_units_per_cube: u32,
    /// Maximum shared memory per cube, in bytes.
    pub max_shared_memory_size: usize,
    /// Maximum number of cubes along each axis of a dispatch.
    pub max_cube_count: u32,
    /// Device memory size, in bytes.
    pub max_memory_size: usize,
    /// Number of cubes executed concurrently.
    pub num_workers: usize,
    /// Upper bound on the number of unit threads alive during a dispatch.
    pub max_threads: usize,
}

impl DeviceProperties {
    /// Properties of a device created with the given configuration.
    pub fn from_config(config: &ComputeConfig) -> Self {
        Self {
            max_units_per_cube: config.max_units_per_cube,
            max_shared_memory_size: config.max_shared_memory_size,
            max_cube_count: config.max_cube_count,
            max_memory_size: config.max_memory_size,
            num_workers: config.num_workers(),
            max_threads: config.max_threads,
        }
    }
}

/// The compute type has the responsibility to retrieve the correct compute client based on the
/// given device.
pub struct ComputeRuntime<Device, Server: ComputeServer> {
    clients: spin::Mutex<Option<HashMap<Device, ComputeClient<Server>>>>,
}

impl<Device, Server> Default for ComputeRuntime<Device, Server>
where
    Device: core::hash::Hash + PartialEq + Eq + Clone + core::fmt::Debug,
    Server: ComputeServer,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Device, Server> ComputeRuntime<Device, Server>
where
    Device: core::hash::Hash + PartialEq + Eq + Clone + core::fmt::Debug,
    Server: ComputeServer,
{
    /// Create a new compute runtime.
    pub const fn new() -> Self {
        Self {
            clients: spin::Mutex::new(None),
        }
    }

    /// Get the compute client for the given device.
    ///
    /// Provide the init function to create a new client if it isn't already initialized.
    pub fn client<Init>(&self, device: &Device, init: Init) -> ComputeClient<Server>
    where
        Init: Fn() -> ComputeClient<Server>,
    {
        let mut clients = self.clients.lock();
        let clients = clients.deref_mut().get_or_insert_with(HashMap::new);

        match clients.get(device) {
            Some(client) => client.clone(),
            None => {
                log::debug!("Creating compute client for device {device:?}");
                let client = init();
                clients.insert(device.clone(), client.clone());
                client
            }
        }
    }

    /// Register the compute client for the given device.
    ///
    /// # Panics
    ///
    /// If a client is already registered for the given device.
    pub fn register(&self, device: &Device, client: ComputeClient<Server>) {
        let mut clients = self.clients.lock();
        let clients = clients.deref_mut().get_or_insert_with(HashMap::new);

        if clients.contains_key(device) {
            panic!("Client already created for device {device:?}");
        }

        clients.insert(device.clone(), client);
    }
}
