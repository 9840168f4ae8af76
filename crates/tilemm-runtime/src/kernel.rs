use core::fmt::Display;

use crate::{CubeElement, cube::UnitContext};

/// Number of units in a cube, along each axis.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CubeDim {
    /// Units along x.
    pub x: u32,
    /// Units along y.
    pub y: u32,
    /// Units along z.
    pub z: u32,
}

impl CubeDim {
    /// Create a new cube dim.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Create a new two dimensional cube dim.
    pub const fn new_2d(x: u32, y: u32) -> Self {
        Self { x, y, z: 1 }
    }

    /// Total number of units in a cube, saturating at `u32::MAX`.
    pub const fn num_elems(&self) -> u32 {
        self.x.saturating_mul(self.y).saturating_mul(self.z)
    }

    /// Total number of units in a cube, `None` when it doesn't fit in a `u32`.
    pub const fn checked_num_elems(&self) -> Option<u32> {
        match self.x.checked_mul(self.y) {
            Some(xy) => xy.checked_mul(self.z),
            None => None,
        }
    }

    /// Unit position from its linear index, x being the slowest axis.
    pub const fn unit_pos(&self, index: u32) -> (u32, u32, u32) {
        let z = index % self.z;
        let y = (index / self.z) % self.y;
        let x = index / (self.z * self.y);
        (x, y, z)
    }
}

impl Default for CubeDim {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl Display for CubeDim {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Identify a kernel and the compile-time parameters it was specialized with.
#[derive(Clone, Debug, Hash, PartialEq, Eq, new)]
pub struct KernelId {
    name: &'static str,
    info: String,
}

impl KernelId {
    /// Kernel name without its parameters.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Display for KernelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.info.is_empty() {
            f.write_str(self.name)
        } else {
            write!(f, "{}<{}>", self.name, self.info)
        }
    }
}

/// A data-parallel kernel executed by every unit of every cube of a dispatch.
///
/// The kernel value itself holds what would be compile-time constants on a real accelerator
/// (problem sizes, tile sizes, unrolling), so the same body is shared by all units.
pub trait CubeKernel<E: CubeElement>: Send + Sync {
    /// The kernel id, including its specialization.
    fn id(&self) -> KernelId;

    /// Number of elements of each shared memory buffer allocated per cube.
    fn shared_memories(&self) -> Vec<usize> {
        Vec::new()
    }

    /// Body of the kernel, run once per unit.
    fn execute(&self, unit: &UnitContext<'_, E>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_pos_covers_every_unit_once() {
        let dim = CubeDim::new(2, 3, 2);
        let mut seen = Vec::new();
        for index in 0..dim.num_elems() {
            let pos = dim.unit_pos(index);
            assert!(pos.0 < 2 && pos.1 < 3 && pos.2 < 2);
            assert!(!seen.contains(&pos));
            seen.push(pos);
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn oversized_cube_dim_does_not_wrap() {
        let dim = CubeDim::new_2d((1 << 31) + 1, 2);

        assert_eq!(dim.checked_num_elems(), None);
        assert_eq!(dim.num_elems(), u32::MAX);
        assert_eq!(CubeDim::new(2, 3, 4).checked_num_elems(), Some(24));
    }

    #[test]
    fn kernel_id_display() {
        let id = KernelId::new("tiled", "tile=4".into());
        assert_eq!(id.to_string(), "tiled<tile=4>");
        assert_eq!(KernelId::new("naive", String::new()).to_string(), "naive");
    }
}
