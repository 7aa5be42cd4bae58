//! Real-time planning poker application library.
//!
//! This library provides a WebSocket-based estimation session server: participants
//! join a named room, select hidden cards, and reveal them simultaneously.

// layers
pub mod domain;
pub mod server;

// shared library
pub mod common;
