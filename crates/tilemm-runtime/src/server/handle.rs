use core::fmt::Display;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

static HANDLE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique id of a device allocation.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandleId {
    value: u64,
}

impl HandleId {
    pub(crate) fn next() -> Self {
        Self {
            value: HANDLE_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Display for HandleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.value)
    }
}

/// Host-side reference to a device allocation.
///
/// The allocation stays alive as long as a handle to it exists. Once every handle is dropped, the
/// server is free to reclaim the memory.
#[derive(Clone, Debug)]
pub struct Handle {
    id: HandleId,
    size: usize,
    _count: Arc<()>,
}

impl Handle {
    pub(crate) fn new(id: HandleId, size: usize, count: Arc<()>) -> Self {
        Self {
            id,
            size,
            _count: count,
        }
    }

    /// The allocation id.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Size of the allocation in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handle {}
