// ABOUTME: Library root for regprune - exposes the engine, backends, and driver for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod output;
pub mod registry;
pub mod retention;
pub mod sweep;
pub mod types;
