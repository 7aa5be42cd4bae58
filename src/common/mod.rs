//! Shared utilities used by binaries and the server library.

pub mod logger;
