//! Crate-internal test tree: shared fixtures, cross-module unit tests and
//! property tests.

pub mod common;
mod property;
mod unit;
