//! Matrix multiplication kernels for the tilemm runtime.
//!
//! Four kernel families compute `C = A × B` on row-major matrices: a naive kernel reading global
//! memory, its coarsened variant where every unit owns several output cells, a tiled kernel staging
//! operand tiles in shared memory, and its coarsened variant. Each can unroll its inner loops.
//!
//! ```rust,ignore
//! let client = CpuRuntime::client(&CpuDevice);
//! let out = tilemm::matmul::<CpuRuntime, f32>(&client, &Strategy::tiling(), &lhs, &rhs)?;
//! ```

#[macro_use]
extern crate derive_new;

/// Matmul building blocks: problem, configurations, layouts, dispatch and errors.
pub mod components;
pub mod kernels;

pub mod benchmark;
pub mod reference;

mod base;

pub use base::*;

#[cfg(any(test, feature = "export_tests"))]
pub mod tests;
