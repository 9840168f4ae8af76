/// Compute configuration.
pub mod compute;
/// Launch logging configuration.
pub mod launch;
/// Profiling configuration.
pub mod profiling;

mod base;
mod logger;

pub use base::*;
pub use logger::*;
