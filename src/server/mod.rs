//! Server module for Plantworks
//!
//! # Module Structure
//!
//! - `config`: Configuration structures
//! - `loader`: Configuration loading from files and environment
//! - `providers`: LLM provider resolution
//! - `init`: Coordinator construction and the HTTP run loop

pub mod config;
mod init;
mod loader;
mod providers;

// Re-export public API
pub use init::{init_coordinator, run};
