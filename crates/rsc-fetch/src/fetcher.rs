//! Transport seam for content fetches.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use http::{HeaderMap, StatusCode};

use crate::{ContentRequest, FetchError};

/// A streamed response body.
pub type BodyStream = BoxStream<'static, Result<Vec<u8>, FetchError>>;

/// Response to a content request: status, headers and a body still being streamed.
pub struct ContentResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body chunks in arrival order.
    pub body: BodyStream,
}

impl ContentResponse {
    /// Create a successful response from a body stream.
    pub fn ok(body: BodyStream) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// Create a successful response with a single-chunk body.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let chunk: Result<Vec<u8>, FetchError> = Ok(bytes.into());
        Self::ok(futures::stream::iter(vec![chunk]).boxed())
    }

    /// Set the status code.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl std::fmt::Debug for ContentResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Issues content requests.
///
/// Implementations must be safe to call repeatedly for the same request;
/// the navigator re-issues fetches freely (pop navigations always refetch).
#[async_trait]
pub trait ContentFetcher: Send + Sync + 'static {
    /// Issue a request and return once response headers are available.
    async fn fetch(&self, request: &ContentRequest) -> Result<ContentResponse, FetchError>;
}

/// Read a response body to completion.
///
/// An error status is reported before any body is read. The returned future
/// completes only once the stream is fully drained.
pub async fn drain(response: ContentResponse, request: &ContentRequest) -> Result<Vec<u8>, FetchError> {
    if response.status.is_client_error() || response.status.is_server_error() {
        return Err(FetchError::Http {
            status: response.status.as_u16(),
            location: request.location().to_string(),
        });
    }

    let mut body = response.body;
    let mut bytes = Vec::new();
    let mut chunks = 0usize;
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk?);
        chunks += 1;
    }

    tracing::trace!(
        location = %request.location(),
        chunks,
        bytes = bytes.len(),
        "content stream drained"
    );

    Ok(bytes)
}
