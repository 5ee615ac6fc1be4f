#![forbid(unsafe_code)]

use async_trait::async_trait;

use crate::error::CacheResult;

/// Page contexts the controller takes over once activation finishes.
#[async_trait]
pub trait Clients: Send + Sync {
    /// Start intercepting requests of every open context. Called after stale stores
    /// are gone, so no context ever observes a mix of versions.
    async fn claim(&self) -> CacheResult<()>;
}

/// No page contexts to claim.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoClients;

#[async_trait]
impl Clients for NoClients {
    async fn claim(&self) -> CacheResult<()> {
        Ok(())
    }
}
