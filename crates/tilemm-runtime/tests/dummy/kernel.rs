use tilemm_runtime::{CubeElement, CubeKernel, KernelId, cube::UnitContext};

/// One unit per element, units past the end do nothing.
pub struct DummyElementwiseAddition;

impl<E: CubeElement> CubeKernel<E> for DummyElementwiseAddition {
    fn id(&self) -> KernelId {
        KernelId::new("elementwise_addition", E::type_name().to_string())
    }

    fn execute(&self, unit: &UnitContext<'_, E>) {
        let index = unit.absolute_pos().0 as usize;
        let (lhs, rhs) = (unit.input(0), unit.input(1));

        if index < lhs.len() {
            unit.output().write(index, lhs[index] + rhs[index]);
        }
    }
}

/// Sums the elements of each cube with a tree reduction in shared memory.
pub struct CubeSum {
    pub units: usize,
}

impl<E: CubeElement> CubeKernel<E> for CubeSum {
    fn id(&self) -> KernelId {
        KernelId::new("cube_sum", format!("{}", self.units))
    }

    fn shared_memories(&self) -> Vec<usize> {
        vec![self.units]
    }

    fn execute(&self, unit: &UnitContext<'_, E>) {
        let local = unit.unit_pos().0 as usize;
        let cube = unit.cube_pos().0 as usize;
        let shared = unit.shared(0);

        shared.write(local, unit.input(0)[cube * self.units + local]);
        unit.sync_cube();

        let mut stride = self.units / 2;
        while stride > 0 {
            if local < stride {
                shared.write(local, shared.read(local) + shared.read(local + stride));
            }
            unit.sync_cube();
            stride /= 2;
        }

        if local == 0 {
            unit.output().write(cube, shared.read(0));
        }
    }
}

/// Reads a shared cell only the first cube stages.
pub struct StaleShared;

impl<E: CubeElement> CubeKernel<E> for StaleShared {
    fn id(&self) -> KernelId {
        KernelId::new("stale_shared", String::new())
    }

    fn shared_memories(&self) -> Vec<usize> {
        vec![1]
    }

    fn execute(&self, unit: &UnitContext<'_, E>) {
        let cube = unit.cube_pos().0;

        if cube == 0 {
            unit.shared(0).write(0, E::one());
        }
        unit.sync_cube();

        unit.output().write(cube as usize, unit.shared(0).read(0));
    }
}

/// Panics on one unit of the grid.
pub struct PanicAt {
    pub absolute: u32,
}

impl<E: CubeElement> CubeKernel<E> for PanicAt {
    fn id(&self) -> KernelId {
        KernelId::new("panic_at", format!("{}", self.absolute))
    }

    fn execute(&self, unit: &UnitContext<'_, E>) {
        let index = unit.absolute_pos().0;
        unit.sync_cube();

        if index == self.absolute {
            panic!("unit {index} failed");
        }
        unit.output().write(index as usize, E::one());
    }
}

/// Only even units reach the barrier.
pub struct DivergentSync;

impl<E: CubeElement> CubeKernel<E> for DivergentSync {
    fn id(&self) -> KernelId {
        KernelId::new("divergent_sync", String::new())
    }

    fn execute(&self, unit: &UnitContext<'_, E>) {
        if unit.unit_pos().0 % 2 == 0 {
            unit.sync_cube();
        }
    }
}

/// Every unit writes the same cell.
pub struct SameCell;

impl<E: CubeElement> CubeKernel<E> for SameCell {
    fn id(&self) -> KernelId {
        KernelId::new("same_cell", String::new())
    }

    fn execute(&self, unit: &UnitContext<'_, E>) {
        unit.output().write(0, E::one());
    }
}

/// Declares a shared memory larger than any device allows.
pub struct HugeShared;

impl<E: CubeElement> CubeKernel<E> for HugeShared {
    fn id(&self) -> KernelId {
        KernelId::new("huge_shared", String::new())
    }

    fn shared_memories(&self) -> Vec<usize> {
        vec![1 << 20]
    }

    fn execute(&self, _unit: &UnitContext<'_, E>) {}
}
