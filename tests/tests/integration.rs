//! Cross-crate scenarios for vitrine.
#![allow(
    clippy::unwrap_used,
    reason = "integration test crate, unwraps are acceptable in test code"
)]

mod common;
mod scenarios;
