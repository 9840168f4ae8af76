#![warn(missing_docs)]

//! Runtime that simulates a data-parallel accelerator on host threads.
//!
//! Kernels are dispatched as a grid of cubes (execution groups). Every unit of a cube runs on its
//! own thread, shares the cube's scratchpad memory and meets the other units at the cube barrier.

#[macro_use]
extern crate derive_new;

/// Compute client module.
pub mod client;
/// Global configuration module.
pub mod config;
/// Execution group (cube) primitives: barrier, shared memory, output memory and unit context.
pub mod cube;
/// Compute server module.
pub mod server;
/// Device storage module.
pub mod storage;

mod base;
mod compute;
mod element;
mod kernel;
mod kernel_timestamps;
mod logging;
mod runtime;

pub use base::*;
pub use compute::CpuServer;
pub use element::*;
pub use kernel::*;
pub use kernel_timestamps::*;
pub use logging::*;
pub use runtime::*;
