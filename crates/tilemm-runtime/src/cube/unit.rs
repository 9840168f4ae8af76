use crate::{
    CubeDim, CubeElement,
    cube::{BarrierError, BarrierPhase, CubeBarrier, GlobalOutput, SharedMemory},
    server::CubeCount,
};

/// Panic payload used to unwind a unit that can't pass a barrier.
///
/// The scheduler recognizes it, so that only the unit that really failed is reported.
#[derive(Debug, Clone)]
pub struct CubeAbort(pub BarrierError);

/// Everything a unit can see while it executes a kernel.
#[derive(new)]
pub struct UnitContext<'a, E: CubeElement> {
    cube_pos: (u32, u32, u32),
    unit_pos: (u32, u32, u32),
    cube_dim: CubeDim,
    cube_count: CubeCount,
    inputs: &'a [&'a [E]],
    output: &'a GlobalOutput<E>,
    shared: &'a [SharedMemory<E>],
    barrier: &'a CubeBarrier,
}

impl<'a, E: CubeElement> UnitContext<'a, E> {
    /// Position of the cube in the dispatch grid.
    pub fn cube_pos(&self) -> (u32, u32, u32) {
        self.cube_pos
    }

    /// Position of the unit inside its cube.
    pub fn unit_pos(&self) -> (u32, u32, u32) {
        self.unit_pos
    }

    /// Position of the unit in the whole dispatch.
    pub fn absolute_pos(&self) -> (u32, u32, u32) {
        (
            self.cube_pos.0 * self.cube_dim.x + self.unit_pos.0,
            self.cube_pos.1 * self.cube_dim.y + self.unit_pos.1,
            self.cube_pos.2 * self.cube_dim.z + self.unit_pos.2,
        )
    }

    /// Number of units per cube.
    pub fn cube_dim(&self) -> CubeDim {
        self.cube_dim
    }

    /// Number of cubes in the dispatch.
    pub fn cube_count(&self) -> CubeCount {
        self.cube_count
    }

    /// Read-only input binding.
    ///
    /// # Panics
    ///
    /// If fewer inputs were bound, like an invalid address fault on a device.
    pub fn input(&self, index: usize) -> &'a [E] {
        match self.inputs.get(index) {
            Some(input) => input,
            None => panic!(
                "Input binding {index} requested but only {} inputs are bound",
                self.inputs.len()
            ),
        }
    }

    /// The output binding.
    pub fn output(&self) -> &'a GlobalOutput<E> {
        self.output
    }

    /// Shared memory buffer of the cube.
    ///
    /// # Panics
    ///
    /// If the kernel declared fewer shared memories.
    pub fn shared(&self, index: usize) -> &'a SharedMemory<E> {
        match self.shared.get(index) {
            Some(memory) => memory,
            None => panic!(
                "Shared memory {index} requested but only {} are allocated",
                self.shared.len()
            ),
        }
    }

    /// Wait until every unit of the cube reached this point.
    ///
    /// Writes to shared memory done before the call are visible to every unit after it. If the
    /// cube failed, the unit unwinds with a [CubeAbort] payload.
    pub fn sync_cube(&self) {
        if let Err(err) = self.barrier.wait(BarrierPhase::Sync) {
            std::panic::resume_unwind(Box::new(CubeAbort(err)));
        }
    }
}
