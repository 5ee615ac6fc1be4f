#![forbid(unsafe_code)]
#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "test utility crate"
)]

//! Shared test utilities for the vitrine workspace.

pub mod http_server;
pub mod images;
pub mod mock_net;
pub mod rng;

pub use http_server::TestHttpServer;
pub use images::{jpeg_fixture, png_fixture};
pub use mock_net::MockNet;
pub use rng::Xorshift64;
