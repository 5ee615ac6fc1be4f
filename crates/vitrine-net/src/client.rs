use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::{Headers, Method, NetOptions, Request, Response},
};

/// [`Net`] over a pooled `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    options: NetOptions,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`NetError`] if the TLS backend cannot be initialised.
    pub fn new(options: NetOptions) -> NetResult<Self> {
        let mut builder = Client::builder().pool_max_idle_per_host(options.pool_max_idle_per_host);
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let inner = builder.build().map_err(NetError::from)?;
        Ok(Self { inner, options })
    }

    pub fn options(&self) -> &NetOptions {
        &self.options
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

#[async_trait]
impl Net for HttpClient {
    async fn fetch(&self, request: Request) -> NetResult<Response> {
        let Request {
            method,
            url,
            headers,
            body,
            ..
        } = request;

        let mut req = self.inner.request(Self::method(method), url.clone());
        for (k, v) in headers.iter() {
            req = req.header(k, v);
        }
        if let Some(body) = body {
            req = req.body(body);
        }
        if let Some(timeout) = self.options.request_timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await.map_err(|e| {
            tracing::debug!(%url, %method, error = %e, "fetch failed");
            NetError::from(e)
        })?;

        let status = resp.status().as_u16();
        let final_url = resp.url().clone();
        let mut out_headers = Headers::new();
        for (name, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                out_headers.insert(name.as_str(), v);
            }
        }
        let body = resp.bytes().await.map_err(NetError::from)?;

        tracing::trace!(%final_url, status, bytes = body.len(), "fetch complete");

        Ok(Response {
            url: final_url,
            status,
            headers: out_headers,
            body,
        })
    }
}
