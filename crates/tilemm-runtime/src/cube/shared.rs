use core::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::CubeElement;

/// Scratchpad memory local to one cube.
///
/// Cells are atomics accessed with relaxed ordering: visibility between units is only guaranteed
/// by the cube barrier, exactly like on real hardware. A fresh cube sees every cell set to NaN, so
/// a cell that was never staged poisons the results that read it instead of leaking data from the
/// previous cube.
#[derive(Debug)]
pub struct SharedMemory<E: CubeElement> {
    cells: Box<[AtomicU64]>,
    _elem: PhantomData<E>,
}

impl<E: CubeElement> SharedMemory<E> {
    /// Allocate a shared memory of `len` elements.
    pub fn new(len: usize) -> Self {
        let nan = E::nan().to_bits_u64();
        Self {
            cells: (0..len).map(|_| AtomicU64::new(nan)).collect(),
            _elem: PhantomData,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the shared memory holds no element.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Size in bytes of the shared memory on the simulated device.
    pub fn size_bytes(&self) -> usize {
        self.len() * size_of::<E>()
    }

    /// Read one element.
    #[inline]
    pub fn read(&self, index: usize) -> E {
        E::from_bits_u64(self.cells[index].load(Ordering::Relaxed))
    }

    /// Write one element.
    #[inline]
    pub fn write(&self, index: usize, value: E) {
        self.cells[index].store(value.to_bits_u64(), Ordering::Relaxed);
    }

    /// Reset every cell to NaN, discarding the previous cube's data.
    pub(crate) fn invalidate(&self) {
        let nan = E::nan().to_bits_u64();
        for cell in self.cells.iter() {
            cell.store(nan, Ordering::Relaxed);
        }
    }
}
