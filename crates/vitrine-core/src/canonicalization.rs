use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::errors::{CoreError, CoreResult};

/// Canonical form of a request URL used for cache identity.
///
/// The fragment is dropped (never sent over the wire) and the query is kept (it selects
/// different content). Scheme, host case and default ports are already normalized by
/// [`Url::parse`].
pub fn canonicalize_request_url(url: &Url) -> CoreResult<String> {
    if url.cannot_be_a_base() {
        return Err(CoreError::InvalidUrl(url.to_string()));
    }
    let mut canonical = url.clone();
    canonical.set_fragment(None);
    Ok(canonical.into())
}

/// Identity of a cached request/response pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn from_url(url: &Url) -> CoreResult<Self> {
        canonicalize_request_url(url).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable filesystem-safe digest of the key.
    pub fn digest_hex(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
