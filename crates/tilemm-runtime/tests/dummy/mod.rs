mod compute;
mod kernel;

pub use compute::*;
pub use kernel::*;
