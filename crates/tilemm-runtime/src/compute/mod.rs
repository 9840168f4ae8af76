mod scheduler;
mod server;
mod team;

pub use server::*;
