use std::sync::Arc;

use async_trait::async_trait;
use vitrine_net::{Net, NetResult, Request, Response};

use crate::{
    controller::{CacheController, FetchDecision},
    storage::CacheStorage,
};

/// [`Net`] whose every request goes through a [`CacheController`] first.
///
/// Pass-through requests go to the controller's own network; rejections surface as the
/// [`NetError`](vitrine_net::NetError) that caused them.
pub struct InterceptedNet<N, S> {
    controller: Arc<CacheController<N, S>>,
}

impl<N, S> InterceptedNet<N, S> {
    pub fn new(controller: Arc<CacheController<N, S>>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &Arc<CacheController<N, S>> {
        &self.controller
    }
}

impl<N, S> Clone for InterceptedNet<N, S> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
        }
    }
}

#[async_trait]
impl<N, S> Net for InterceptedNet<N, S>
where
    N: Net,
    S: CacheStorage,
{
    async fn fetch(&self, request: Request) -> NetResult<Response> {
        match self.controller.handle_fetch(&request).await {
            FetchDecision::Respond(response) => Ok(response),
            FetchDecision::PassThrough => self.controller.net().fetch(request).await,
            FetchDecision::Reject(e) => {
                tracing::debug!(key = e.key(), "intercepted request rejected");
                Err(e.into_net_error())
            }
        }
    }
}
