//! End-to-end tests for the application lifecycle.
//!
//! Each case builds an `App` with recording mock services, runs it against
//! ephemeral loopback ports and asserts on the journal of lifecycle calls, the
//! returned error, the final status and the HTTP surface.

mod cases_registration_test;

pub mod support;
