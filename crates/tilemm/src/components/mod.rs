pub mod dispatch;

mod config;
mod error;
mod layout;
mod problem;

pub use config::*;
pub use dispatch::{CoverageDefect, DispatchDescriptor, WriteCoverage};
pub use error::*;
pub use layout::*;
pub use problem::*;
