mod barrier;
mod output;
mod shared;
mod unit;

pub use barrier::*;
pub use output::*;
pub use shared::*;
pub use unit::*;
