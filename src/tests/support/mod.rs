// Shared test support code for integration tests.
// This module provides common utilities that all test files can use.

pub mod common;
pub mod harness;
pub mod service;

pub use common::*;
pub use harness::{new_app, RunningApp};
pub use service::{Journal, MockService};
