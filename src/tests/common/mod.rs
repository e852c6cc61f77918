//! Common Test Utilities
//!
//! Shared fixtures and proptest strategies used across test modules.

pub mod fixtures;

pub use fixtures::*;
