//! Shared utilities for citadelle.
//!
//! This crate provides common utilities used across the citadelle workspace:
//! - ULID-based identifier generation
//! - Logging setup with tracing
//! - Config and data directory resolution
//! - RAII-based timing for operation measurement

pub mod id;
pub mod log;
pub mod path;
pub mod timing;

pub use id::{IdPrefix, Identifier};
pub use timing::TimingGuard;
