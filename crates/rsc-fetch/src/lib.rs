//! Content fetching for the navigation runtime.
//!
//! This crate provides:
//! - `ContentRequest` - Content and server-action requests
//! - `ContentFetcher` - Transport seam returning a streamed body
//! - `ContentHandle` - Shared, drain-on-completion handle to fetched content
//! - `ScriptedFetcher` / `GatedFetcher` - In-process fetchers for tests and simulation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rsc_core::{Location, NavigatorConfig};
//! use rsc_fetch::{ContentHandle, ContentRequest, ScriptedFetcher};
//!
//! let fetcher = Arc::new(ScriptedFetcher::new().route("/ships", "<ships/>"));
//! let request = ContentRequest::content(&NavigatorConfig::default(), &Location::parse("/ships")?)?;
//! let handle = ContentHandle::fetch(fetcher, request);
//! let content = handle.read().await?;
//! ```

mod error;
mod fetcher;
mod handle;
mod request;
mod scripted;

pub use error::*;
pub use fetcher::*;
pub use handle::*;
pub use request::*;
pub use scripted::*;
