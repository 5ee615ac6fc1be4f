use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    types::{Destination, Request, Response},
};

#[async_trait]
pub trait Net: Send + Sync {
    /// Perform one request.
    async fn fetch(&self, request: Request) -> NetResult<Response>;

    /// GET `url` and return the body, failing on a non-2xx status.
    async fn get_bytes(&self, url: Url, destination: Destination) -> NetResult<Bytes> {
        let response = self
            .fetch(Request::get(url).with_destination(destination))
            .await?;
        if !response.is_success() {
            return Err(NetError::http_status(
                response.status,
                response.url.to_string(),
            ));
        }
        Ok(response.body)
    }
}

#[async_trait]
impl<N: Net + ?Sized> Net for Arc<N> {
    async fn fetch(&self, request: Request) -> NetResult<Response> {
        (**self).fetch(request).await
    }
}
