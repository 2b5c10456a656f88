//! Shared handles to fetched content.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use rsc_core::Location;
use serde::Deserialize;

use crate::{drain, ContentFetcher, ContentRequest, FetchError, RequestKind};

/// Content that has been fetched and fully drained.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    /// Location the content was fetched for.
    pub location: Location,
    /// Serialized root to hand to the render layer.
    pub root: Vec<u8>,
    /// Return value of a server action. `None` for plain content.
    pub return_value: Option<serde_json::Value>,
}

/// Body of an action response.
#[derive(Debug, Deserialize)]
struct ActionEnvelope {
    #[serde(default)]
    root: serde_json::Value,
    #[serde(rename = "returnValue", default)]
    return_value: serde_json::Value,
}

impl Content {
    /// Decode a drained body according to what was requested.
    ///
    /// Content bodies are kept opaque. Action bodies are a JSON envelope
    /// `{"root": ..., "returnValue": ...}`.
    pub fn decode(request: &ContentRequest, body: Vec<u8>) -> Result<Self, FetchError> {
        match request.kind() {
            RequestKind::Content => Ok(Self {
                location: request.location().clone(),
                root: body,
                return_value: None,
            }),
            RequestKind::Action { .. } => {
                let envelope: ActionEnvelope = serde_json::from_slice(&body)?;
                Ok(Self {
                    location: request.location().clone(),
                    root: serde_json::to_vec(&envelope.root)?,
                    return_value: Some(envelope.return_value),
                })
            }
        }
    }

    /// The root as UTF-8 text, if it is valid UTF-8.
    pub fn root_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.root).ok()
    }
}

/// Observable state of a content handle.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleState {
    /// Still fetching or draining.
    Pending,
    /// Fully drained.
    Resolved(Arc<Content>),
    /// Fetch or drain failed.
    Failed(FetchError),
}

type SharedContent = Shared<BoxFuture<'static, Result<Arc<Content>, FetchError>>>;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Deferred handle to the content for one location.
///
/// Cloning is cheap and every clone observes the same result. The handle
/// resolves only once the response body has been fully drained, so anything
/// awaiting it runs after the data is available.
#[derive(Clone)]
pub struct ContentHandle {
    id: u64,
    location: Location,
    inner: SharedContent,
}

impl ContentHandle {
    /// Issue `request` through `fetcher` and wrap its completion.
    ///
    /// The fetch makes progress while any clone of the handle is being awaited.
    pub fn fetch<F>(fetcher: Arc<F>, request: ContentRequest) -> Self
    where
        F: ContentFetcher + ?Sized,
    {
        let location = request.location().clone();
        let future = async move {
            let response = fetcher.fetch(&request).await?;
            let body = drain(response, &request).await?;
            Content::decode(&request, body).map(Arc::new)
        };

        Self::from_future(location, future.boxed())
    }

    /// A handle that is already resolved.
    pub fn resolved(content: Content) -> Self {
        let location = content.location.clone();
        let handle = Self::from_future(
            location,
            futures::future::ready(Ok(Arc::new(content))).boxed(),
        );
        let _ = handle.inner.clone().now_or_never();
        handle
    }

    /// A handle that has already failed.
    pub fn failed(location: Location, error: FetchError) -> Self {
        let handle = Self::from_future(location, futures::future::ready(Err(error)).boxed());
        let _ = handle.inner.clone().now_or_never();
        handle
    }

    fn from_future(
        location: Location,
        future: BoxFuture<'static, Result<Arc<Content>, FetchError>>,
    ) -> Self {
        Self {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            location,
            inner: future.shared(),
        }
    }

    /// Location this handle fetches.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Whether two handles share the same underlying fetch.
    pub fn same_fetch(&self, other: &ContentHandle) -> bool {
        self.id == other.id
    }

    /// Current state without waiting.
    pub fn state(&self) -> HandleState {
        match self.inner.peek() {
            None => HandleState::Pending,
            Some(Ok(content)) => HandleState::Resolved(content.clone()),
            Some(Err(e)) => HandleState::Failed(e.clone()),
        }
    }

    /// Whether the handle is still pending.
    pub fn is_pending(&self) -> bool {
        self.inner.peek().is_none()
    }

    /// Wait for the content. A failed handle yields its fetch error.
    pub async fn read(&self) -> Result<Arc<Content>, FetchError> {
        self.inner.clone().await
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.peek() {
            None => "pending",
            Some(Ok(_)) => "resolved",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("ContentHandle")
            .field("id", &self.id)
            .field("location", &self.location)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentResponse, GatedFetcher, ScriptedFetcher};
    use rsc_core::NavigatorConfig;

    fn loc(s: &str) -> Location {
        Location::parse(s).unwrap()
    }

    fn content_request(s: &str) -> ContentRequest {
        ContentRequest::content(&NavigatorConfig::default(), &loc(s)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_resolves_after_drain() {
        let fetcher = Arc::new(ScriptedFetcher::new().route("/ships", "<ships/>"));
        let handle = ContentHandle::fetch(fetcher, content_request("/ships"));

        assert!(handle.is_pending());
        let content = handle.read().await.unwrap();

        assert_eq!(content.root_str(), Some("<ships/>"));
        assert_eq!(content.return_value, None);
        assert!(matches!(handle.state(), HandleState::Resolved(_)));
    }

    #[tokio::test]
    async fn test_clones_share_one_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new().route("/a", "a"));
        let handle = ContentHandle::fetch(fetcher.clone(), content_request("/a"));
        let clone = handle.clone();

        let (first, second) = futures::join!(handle.read(), clone.read());
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(fetcher.requests().len(), 1);
        assert!(handle.same_fetch(&clone));
    }

    #[tokio::test]
    async fn test_pending_until_gate_released() {
        let fetcher = Arc::new(GatedFetcher::new());
        let handle = ContentHandle::fetch(fetcher.clone(), content_request("/slow"));

        let reader = tokio::spawn({
            let handle = handle.clone();
            async move { handle.read().await }
        });

        fetcher.wait_for_requests(1).await;
        assert!(handle.is_pending());

        fetcher
            .release("/slow", ContentResponse::from_bytes("done"))
            .await;
        let content = reader.await.unwrap().unwrap();
        assert_eq!(content.root_str(), Some("done"));
        assert!(!handle.is_pending());
    }

    #[tokio::test]
    async fn test_failed_fetch_reported_to_every_reader() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let handle = ContentHandle::fetch(fetcher, content_request("/missing"));

        let err = handle.read().await.unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 404, .. }));
        assert_eq!(handle.state(), HandleState::Failed(err.clone()));
        assert_eq!(handle.clone().read().await.unwrap_err(), err);
    }

    #[tokio::test]
    async fn test_action_envelope_decoded() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .action("like", r#"{"root": {"likes": 3}, "returnValue": {"ok": true}}"#),
        );
        let request =
            ContentRequest::action(&NavigatorConfig::default(), &loc("/"), "like", &()).unwrap();
        let content = ContentHandle::fetch(fetcher, request).read().await.unwrap();

        assert_eq!(content.return_value, Some(serde_json::json!({"ok": true})));
        let root: serde_json::Value = serde_json::from_slice(&content.root).unwrap();
        assert_eq!(root, serde_json::json!({"likes": 3}));
    }

    #[tokio::test]
    async fn test_malformed_action_body_fails_decode() {
        let fetcher = Arc::new(ScriptedFetcher::new().action("like", "not json"));
        let request =
            ContentRequest::action(&NavigatorConfig::default(), &loc("/"), "like", &()).unwrap();

        let err = ContentHandle::fetch(fetcher, request).read().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_ready_constructors_are_observable_immediately() {
        let content = Content {
            location: loc("/"),
            root: b"x".to_vec(),
            return_value: None,
        };
        let resolved = ContentHandle::resolved(content.clone());
        assert_eq!(resolved.state(), HandleState::Resolved(Arc::new(content)));

        let failed = ContentHandle::failed(loc("/"), FetchError::Connection("down".into()));
        assert_eq!(
            failed.state(),
            HandleState::Failed(FetchError::Connection("down".into()))
        );
    }
}
