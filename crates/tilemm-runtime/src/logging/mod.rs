mod profiling;
mod server;

pub(crate) use profiling::*;
pub use server::*;
