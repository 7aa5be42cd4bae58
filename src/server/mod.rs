//! WebSocket planning poker server implementation.

pub mod events;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::run_server;
