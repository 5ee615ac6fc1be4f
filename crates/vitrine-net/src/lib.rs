#![forbid(unsafe_code)]

//! Fetch abstraction for vitrine.
//!
//! [`Net`] models the browser `fetch` primitive: a [`Request`] goes out, a [`Response`]
//! comes back. A non-2xx status is still a response; only transport failures are errors.

mod client;
mod error;
mod traits;
mod types;

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    traits::Net,
    types::{Destination, Headers, Method, NetOptions, Request, Response},
};
