//! In-process fetchers for tests and simulation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use http::StatusCode;
use tokio::sync::{oneshot, Notify};

use crate::{ContentFetcher, ContentRequest, ContentResponse, FetchError, RequestKind};

/// Canned response served by a `ScriptedFetcher`.
#[derive(Debug, Clone)]
pub struct ScriptedRoute {
    body: Vec<u8>,
    status: StatusCode,
    delay: Duration,
    chunks: usize,
}

impl ScriptedRoute {
    /// Serve `body` with status 200, immediately, in one chunk.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            status: StatusCode::OK,
            delay: Duration::ZERO,
            chunks: 1,
        }
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer with this status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Split the body into this many chunks.
    pub fn with_chunks(mut self, chunks: usize) -> Self {
        self.chunks = chunks.max(1);
        self
    }

    fn response(&self) -> ContentResponse {
        let chunk_size = self.body.len().div_ceil(self.chunks).max(1);
        let chunks: Vec<Result<Vec<u8>, FetchError>> = self
            .body
            .chunks(chunk_size)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();

        ContentResponse::ok(futures::stream::iter(chunks).boxed()).with_status(self.status)
    }
}

/// Fetcher that serves canned responses keyed by location or action id.
///
/// Unknown locations answer 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    routes: HashMap<String, ScriptedRoute>,
    actions: HashMap<String, ScriptedRoute>,
    requests: Mutex<Vec<ContentRequest>>,
}

impl ScriptedFetcher {
    /// Create a fetcher with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `location`.
    pub fn route(self, location: &str, body: impl Into<Vec<u8>>) -> Self {
        self.route_with(location, ScriptedRoute::new(body))
    }

    /// Serve a configured response for `location`.
    pub fn route_with(mut self, location: &str, route: ScriptedRoute) -> Self {
        self.routes.insert(location.to_string(), route);
        self
    }

    /// Serve `body` for the action `id`. The body should be an action envelope.
    pub fn action(self, id: &str, body: impl Into<Vec<u8>>) -> Self {
        self.action_with(id, ScriptedRoute::new(body))
    }

    /// Serve a configured response for the action `id`.
    pub fn action_with(mut self, id: &str, route: ScriptedRoute) -> Self {
        self.actions.insert(id.to_string(), route);
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ContentRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup(&self, request: &ContentRequest) -> Option<&ScriptedRoute> {
        match request.kind() {
            RequestKind::Action { id } => self.actions.get(id),
            RequestKind::Content => {
                let location = request.location();
                self.routes
                    .get(location.as_str())
                    .or_else(|| self.routes.get(location.path()))
            }
        }
    }
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &ContentRequest) -> Result<ContentResponse, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let Some(route) = self.lookup(request).cloned() else {
            tracing::debug!(uri = %request.uri(), "no scripted route");
            return Ok(ContentResponse::ok(futures::stream::empty().boxed())
                .with_status(StatusCode::NOT_FOUND));
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        Ok(route.response())
    }
}

type GateReply = oneshot::Sender<Result<ContentResponse, FetchError>>;

#[derive(Default)]
struct GateState {
    pending: Vec<(ContentRequest, GateReply)>,
    seen: Vec<ContentRequest>,
}

/// Fetcher whose requests stay pending until the caller releases them.
///
/// Lets tests decide the exact order in which racing fetches complete.
#[derive(Default)]
pub struct GatedFetcher {
    state: Mutex<GateState>,
    arrived: Notify,
}

impl GatedFetcher {
    /// Create a fetcher with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ContentRequest> {
        self.lock().seen.clone()
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Wait until at least `count` requests have been received.
    pub async fn wait_for_requests(&self, count: usize) {
        loop {
            let notified = self.arrived.notified();
            if self.lock().seen.len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Answer the oldest pending content request for `location`.
    ///
    /// Waits for such a request to arrive if there is none yet.
    pub async fn release(&self, location: &str, response: ContentResponse) {
        let reply = self
            .take(|r| r.action_id().is_none() && r.location().as_str() == location)
            .await;
        let _ = reply.send(Ok(response));
    }

    /// Answer the oldest pending request for the action `id`.
    pub async fn release_action(&self, id: &str, response: ContentResponse) {
        let reply = self.take(|r| r.action_id() == Some(id)).await;
        let _ = reply.send(Ok(response));
    }

    /// Fail the oldest pending content request for `location`.
    pub async fn fail(&self, location: &str, error: FetchError) {
        let reply = self
            .take(|r| r.action_id().is_none() && r.location().as_str() == location)
            .await;
        let _ = reply.send(Err(error));
    }

    async fn take(&self, matches: impl Fn(&ContentRequest) -> bool) -> GateReply {
        loop {
            let notified = self.arrived.notified();
            {
                let mut state = self.lock();
                if let Some(index) = state.pending.iter().position(|(r, _)| matches(r)) {
                    return state.pending.remove(index).1;
                }
            }
            notified.await;
        }
    }
}

#[async_trait]
impl ContentFetcher for GatedFetcher {
    async fn fetch(&self, request: &ContentRequest) -> Result<ContentResponse, FetchError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.lock();
            state.seen.push(request.clone());
            state.pending.push((request.clone(), tx));
        }
        self.arrived.notify_waiters();

        rx.await
            .map_err(|_| FetchError::Connection("gated fetcher dropped the request".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drain;
    use rsc_core::{Location, NavigatorConfig};

    fn request(s: &str) -> ContentRequest {
        ContentRequest::content(&NavigatorConfig::default(), &Location::parse(s).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_scripted_route_served_in_chunks() {
        let fetcher = ScriptedFetcher::new()
            .route_with("/ships", ScriptedRoute::new("abcdefgh").with_chunks(3));
        let req = request("/ships");

        let response = fetcher.fetch(&req).await.unwrap();
        assert_eq!(drain(response, &req).await.unwrap(), b"abcdefgh");
    }

    #[tokio::test]
    async fn test_scripted_query_falls_back_to_path() {
        let fetcher = ScriptedFetcher::new().route("/ships", "list");
        let req = request("/ships?search=x");

        let response = fetcher.fetch(&req).await.unwrap();
        assert_eq!(drain(response, &req).await.unwrap(), b"list");
    }

    #[tokio::test]
    async fn test_scripted_unknown_route_is_404() {
        let fetcher = ScriptedFetcher::new();
        let response = fetcher.fetch(&request("/nope")).await.unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_delay() {
        let fetcher = ScriptedFetcher::new().route_with(
            "/slow",
            ScriptedRoute::new("x").with_delay(Duration::from_millis(250)),
        );

        let start = tokio::time::Instant::now();
        fetcher.fetch(&request("/slow")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_gated_release_out_of_order() {
        let fetcher = std::sync::Arc::new(GatedFetcher::new());

        let first = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.fetch(&request("/a")).await.map(|r| r.status) }
        });
        let second = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.fetch(&request("/b")).await.map(|r| r.status) }
        });

        fetcher.wait_for_requests(2).await;
        assert_eq!(fetcher.pending_count(), 2);

        fetcher.release("/b", ContentResponse::from_bytes("b")).await;
        assert_eq!(second.await.unwrap().unwrap(), StatusCode::OK);
        assert_eq!(fetcher.pending_count(), 1);

        fetcher.fail("/a", FetchError::Connection("reset".into())).await;
        assert_eq!(
            first.await.unwrap().unwrap_err(),
            FetchError::Connection("reset".into())
        );
    }
}
