mod accumulate;
mod base;
mod staging;
mod writer;

pub use base::*;
pub use writer::unit_outputs;
