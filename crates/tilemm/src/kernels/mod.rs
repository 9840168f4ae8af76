//! Matmul kernels.
//!
//! All kernels compute `C = A × B` for row-major matrices, `A` being `N×M`, `B` being `M×K` and
//! `C` being `N×K`. Every output cell is written by exactly one unit.

/// Kernel reading operands straight from global memory.
pub mod naive;
/// Kernel staging operand tiles in shared memory.
pub mod tiled;
/// Loop unrolling helpers.
pub mod unroll;
