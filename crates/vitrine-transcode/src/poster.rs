#![forbid(unsafe_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;
use vitrine_net::{Net, Request};

use crate::error::PosterError;

/// Remote collaborator producing a still poster image for an uploaded video.
#[async_trait]
pub trait PosterGenerator: Send + Sync {
    /// # Errors
    ///
    /// Any [`PosterError`]; callers treat it as "no poster".
    async fn poster(&self, video_path: &str) -> Result<Url, PosterError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PosterRequest<'a> {
    video_path: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PosterResponse {
    thumbnail_url: Option<String>,
}

/// Calls a poster endpoint with `POST {"videoPath": ..}` and reads `{"thumbnailUrl": ..}`.
pub struct HttpPosterGenerator<N> {
    net: N,
    endpoint: Url,
    bearer: Option<String>,
}

impl<N: Net> HttpPosterGenerator<N> {
    pub fn new(net: N, endpoint: Url) -> Self {
        Self {
            net,
            endpoint,
            bearer: None,
        }
    }

    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

#[async_trait]
impl<N: Net> PosterGenerator for HttpPosterGenerator<N> {
    async fn poster(&self, video_path: &str) -> Result<Url, PosterError> {
        let body = serde_json::to_vec(&PosterRequest { video_path })
            .map_err(|e| PosterError::Malformed(e.to_string()))?;
        let mut request = Request::post(self.endpoint.clone(), body)
            .with_header("content-type", "application/json");
        if let Some(token) = &self.bearer {
            request = request.with_header("authorization", format!("Bearer {token}"));
        }

        let response = self.net.fetch(request).await?;
        if !response.is_success() {
            tracing::debug!(status = response.status, video_path, "poster service refused");
            return Err(PosterError::Status(response.status));
        }

        let parsed: PosterResponse = serde_json::from_slice(&response.body)
            .map_err(|e| PosterError::Malformed(e.to_string()))?;
        let raw = parsed
            .thumbnail_url
            .ok_or_else(|| PosterError::Malformed("missing thumbnailUrl".to_string()))?;
        Url::parse(&raw).map_err(|e| PosterError::Malformed(format!("{raw}: {e}")))
    }
}
