//! Shared test utilities for clipguard integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with temp storage roots and a recording catalog
//! - Builders for encrypted uploads and config files

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
