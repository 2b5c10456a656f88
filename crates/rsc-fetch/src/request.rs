//! Content and server-action requests.

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use rsc_core::{Location, NavigatorConfig};
use serde::Serialize;

use crate::FetchError;

/// Media type of serialized streamed content.
pub const RSC_CONTENT_TYPE: &str = "text/x-component";

/// Header carrying the server action id.
pub const ACTION_HEADER: &str = "rsc-action";

/// What a request asks the server for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Rendered content for a location.
    Content,
    /// Invocation of a server action; the response also carries its return value.
    Action { id: String },
}

/// A request for streamed content.
///
/// Built from the navigator configuration so every fetcher sees the same
/// endpoint layout: `GET {content_endpoint}{location}` for content and
/// `POST {action_endpoint}{location}` for actions.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    kind: RequestKind,
    location: Location,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ContentRequest {
    /// Build a content request for a location.
    pub fn content(config: &NavigatorConfig, location: &Location) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(RSC_CONTENT_TYPE));

        Ok(Self {
            kind: RequestKind::Content,
            location: location.clone(),
            method: Method::GET,
            uri: endpoint_uri(&config.content_endpoint, location)?,
            headers,
            body: Vec::new(),
        })
    }

    /// Build a server action request. `args` is serialized as the JSON body.
    pub fn action<A>(
        config: &NavigatorConfig,
        location: &Location,
        action_id: &str,
        args: &A,
    ) -> Result<Self, FetchError>
    where
        A: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(args)
            .map_err(|e| FetchError::Request(format!("failed to encode action arguments: {}", e)))?;
        let action_value = HeaderValue::from_str(action_id)
            .map_err(|_| FetchError::Request(format!("invalid action id: {:?}", action_id)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(RSC_CONTENT_TYPE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(ACTION_HEADER), action_value);

        Ok(Self {
            kind: RequestKind::Action {
                id: action_id.to_string(),
            },
            location: location.clone(),
            method: Method::POST,
            uri: endpoint_uri(&config.action_endpoint, location)?,
            headers,
            body,
        })
    }

    /// Get the request kind.
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Get the action id, if this is an action request.
    pub fn action_id(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::Action { id } => Some(id),
            RequestKind::Content => None,
        }
    }

    /// Get the location the content is for.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Get the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the request URI (endpoint prefix + location).
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Get the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into an `http::Request` for a transport.
    pub fn to_http(&self) -> Result<http::Request<Vec<u8>>, FetchError> {
        let mut builder = http::Request::builder()
            .method(self.method.clone())
            .uri(self.uri.clone());
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }
        Ok(builder.body(self.body.clone())?)
    }
}

fn endpoint_uri(endpoint: &str, location: &Location) -> Result<Uri, FetchError> {
    let raw = if endpoint == "/" {
        location.to_string()
    } else {
        format!("{}{}", endpoint, location)
    };

    raw.parse::<Uri>()
        .map_err(|e| FetchError::Request(format!("invalid request path {:?}: {}", raw, e)))
}
