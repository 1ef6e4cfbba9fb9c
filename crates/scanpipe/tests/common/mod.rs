//! Shared test utilities for scanpipe integration tests.
//!
//! This module provides:
//! - `ScriptedRunner`, a stand-in for the external tools
//! - `TestHarness` for running jobs through the scheduler in a temp directory

pub mod harness;

pub use harness::*;
