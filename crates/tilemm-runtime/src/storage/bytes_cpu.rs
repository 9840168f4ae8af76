use hashbrown::HashMap;
use std::sync::Arc;

use crate::server::{Handle, HandleId, IoError};

use super::MemoryUsage;

/// Allocations are backed by 64-bit words, so that any [CubeElement](crate::CubeElement) can be
/// viewed in place without realignment.
#[derive(Debug)]
struct Allocation {
    words: Vec<u64>,
    size: usize,
    count: Arc<()>,
}

impl Allocation {
    fn new(size: usize) -> Self {
        Self {
            words: vec![0; size.div_ceil(size_of::<u64>())],
            size,
            count: Arc::new(()),
        }
    }

    fn is_free(&self) -> bool {
        Arc::strong_count(&self.count) == 1
    }
}

/// Device memory of the simulated accelerator, stored in host RAM.
#[derive(Debug)]
pub struct BytesStorage {
    allocations: HashMap<HandleId, Allocation>,
    bytes_in_use: usize,
    max_size: usize,
}

impl BytesStorage {
    /// Create a storage that can hold at most `max_size` bytes.
    pub fn new(max_size: usize) -> Self {
        Self {
            allocations: HashMap::new(),
            bytes_in_use: 0,
            max_size,
        }
    }

    /// Reserve a zeroed allocation.
    ///
    /// Allocations without handles are reclaimed first when the device would run out of memory.
    pub fn alloc(&mut self, size: usize) -> Result<Handle, IoError> {
        if self.bytes_in_use + size > self.max_size {
            self.cleanup();
        }

        if self.bytes_in_use + size > self.max_size {
            return Err(IoError::OutOfMemory {
                requested: size,
                used: self.bytes_in_use,
                max: self.max_size,
            });
        }

        let id = HandleId::next();
        let allocation = Allocation::new(size);
        let handle = Handle::new(id, size, allocation.count.clone());

        self.bytes_in_use += size;
        self.allocations.insert(id, allocation);

        Ok(handle)
    }

    /// Bytes of an allocation.
    pub fn bytes(&self, handle: &Handle) -> Result<&[u8], IoError> {
        let allocation = self
            .allocations
            .get(&handle.id())
            .ok_or(IoError::InvalidHandle { id: handle.id() })?;

        Ok(&bytemuck::cast_slice(&allocation.words)[..allocation.size])
    }

    /// Mutable bytes of an allocation.
    pub fn bytes_mut(&mut self, handle: &Handle) -> Result<&mut [u8], IoError> {
        let allocation = self
            .allocations
            .get_mut(&handle.id())
            .ok_or(IoError::InvalidHandle { id: handle.id() })?;

        Ok(&mut bytemuck::cast_slice_mut(&mut allocation.words)[..allocation.size])
    }

    /// Drop every allocation no handle points to, returns the number of bytes freed.
    pub fn cleanup(&mut self) -> usize {
        let mut freed = 0;
        self.allocations.retain(|_, allocation| {
            if allocation.is_free() {
                freed += allocation.size;
                false
            } else {
                true
            }
        });
        self.bytes_in_use -= freed;

        if freed > 0 {
            log::debug!("Reclaimed {freed} bytes of device memory");
        }

        freed
    }

    /// The current memory usage.
    pub fn usage(&self) -> MemoryUsage {
        MemoryUsage {
            number_allocs: self.allocations.len() as u64,
            bytes_in_use: self.bytes_in_use as u64,
            bytes_limit: self.max_size as u64,
        }
    }
}
