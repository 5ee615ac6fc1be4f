//! Scriptable in-memory [`Net`].

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use url::Url;
use vitrine_net::{Net, NetError, NetResult, Request, Response};

#[derive(Clone)]
enum Route {
    Respond(Response),
    Fail(NetError),
}

#[derive(Default)]
struct Inner {
    routes: HashMap<String, Route>,
    delays: HashMap<String, Duration>,
    log: Vec<Request>,
}

/// Network double: fixed responses per URL, an offline switch and a request log.
///
/// Unknown URLs answer `404`.
#[derive(Clone, Default)]
pub struct MockNet {
    inner: Arc<Mutex<Inner>>,
    offline: Arc<AtomicBool>,
}

impl MockNet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`.
    pub fn route(&self, url: &Url, body: impl Into<Bytes>) -> &Self {
        self.respond(url, Response::ok(url.clone(), body))
    }

    pub fn route_status(&self, url: &Url, status: u16, body: impl Into<Bytes>) -> &Self {
        self.respond(url, Response::new(url.clone(), status, body))
    }

    pub fn respond(&self, url: &Url, response: Response) -> &Self {
        self.inner
            .lock()
            .routes
            .insert(url.to_string(), Route::Respond(response));
        self
    }

    pub fn fail(&self, url: &Url, error: NetError) -> &Self {
        self.inner
            .lock()
            .routes
            .insert(url.to_string(), Route::Fail(error));
        self
    }

    pub fn delay(&self, url: &Url, delay: Duration) -> &Self {
        self.inner.lock().delays.insert(url.to_string(), delay);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of requests that reached this network for `url`.
    pub fn hits(&self, url: &Url) -> usize {
        self.inner
            .lock()
            .log
            .iter()
            .filter(|r| r.url == *url)
            .count()
    }

    pub fn total_hits(&self) -> usize {
        self.inner.lock().log.len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.inner.lock().log.clone()
    }
}

#[async_trait]
impl Net for MockNet {
    async fn fetch(&self, request: Request) -> NetResult<Response> {
        let key = request.url.to_string();
        let (route, delay) = {
            let mut inner = self.inner.lock();
            inner.log.push(request.clone());
            (
                inner.routes.get(&key).cloned(),
                inner.delays.get(&key).copied(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetError::http("network unreachable"));
        }

        match route {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Fail(error)) => Err(error),
            None => Ok(Response::new(request.url, 404, Bytes::new())),
        }
    }
}
