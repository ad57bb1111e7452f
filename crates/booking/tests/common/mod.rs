//! Shared utilities for booking integration tests.
//!
//! - `TestHarness` wires a service to a memory or local store
//! - `RequestBuilder` produces valid submissions to tweak per test
//! - `FaultyGateway` fails chosen store operations

pub mod builders;
pub mod faulty;
pub mod harness;

pub use builders::*;
pub use faulty::Faults;
pub use harness::TestHarness;
