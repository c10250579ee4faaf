#[macro_use]
extern crate tracing;

pub mod cli;
pub mod config;
pub mod ipc;
pub mod render;
pub mod shared;
pub mod state;
pub mod utils;
