//! Domain types and stores for chatkeep.
//!
//! - [`session`]: conversation sessions, their persistence interface and autosave
//! - [`memory`]: the vector memory store
//! - [`config`]: typed configuration

pub mod config;
pub mod error;
pub mod memory;
pub mod session;

// Re-export common error type
pub use error::{ChatkeepError, Result};
