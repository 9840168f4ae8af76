use core::marker::PhantomData;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use crate::CubeElement;

/// Output buffer of a dispatch, owned by the device while the kernel runs.
///
/// Units of different cubes write concurrently without synchronization, which is only sound
/// because every cell is written by a single unit. Each cell counts its writes and the first cell
/// written twice is remembered, so a broken partition is reported instead of silently racing.
#[derive(Debug)]
pub struct GlobalOutput<E: CubeElement> {
    cells: Box<[AtomicU64]>,
    writes: Box<[AtomicU32]>,
    overlap: AtomicUsize,
    _elem: PhantomData<E>,
}

impl<E: CubeElement> GlobalOutput<E> {
    /// Create the output from the current content of the device buffer.
    pub fn from_slice(data: &[E]) -> Self {
        Self {
            cells: data
                .iter()
                .map(|value| AtomicU64::new(value.to_bits_u64()))
                .collect(),
            writes: data.iter().map(|_| AtomicU32::new(0)).collect(),
            overlap: AtomicUsize::new(usize::MAX),
            _elem: PhantomData,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the output holds no element.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Write one element.
    #[inline]
    pub fn write(&self, index: usize, value: E) {
        self.cells[index].store(value.to_bits_u64(), Ordering::Relaxed);

        if self.writes[index].fetch_add(1, Ordering::Relaxed) > 0 {
            self.overlap.fetch_min(index, Ordering::Relaxed);
        }
    }

    /// Read one element.
    #[inline]
    pub fn read(&self, index: usize) -> E {
        E::from_bits_u64(self.cells[index].load(Ordering::Relaxed))
    }

    /// Number of times the cell was written so far.
    pub fn write_count(&self, index: usize) -> u32 {
        self.writes[index].load(Ordering::Relaxed)
    }

    /// Smallest index written more than once, if any.
    pub fn first_overlap(&self) -> Option<usize> {
        match self.overlap.load(Ordering::Relaxed) {
            usize::MAX => None,
            index => Some(index),
        }
    }

    /// Number of distinct cells written at least once.
    pub fn num_written(&self) -> usize {
        self.writes
            .iter()
            .filter(|count| count.load(Ordering::Relaxed) > 0)
            .count()
    }

    /// Copy the content of the output back into a contiguous buffer.
    pub fn to_vec(&self) -> Vec<E> {
        (0..self.len()).map(|index| self.read(index)).collect()
    }
}
