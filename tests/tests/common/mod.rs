// Common fixtures and utilities for integration tests

pub mod fixtures;
pub mod page;

pub use fixtures::*;
pub use page::*;
