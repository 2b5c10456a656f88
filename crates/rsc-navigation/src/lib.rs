//! Client navigation for streamed server-rendered content.
//!
//! This crate provides:
//! - `ContentCache` - History-keyed cache of pending/resolved content handles
//! - `HistoryStore` / `MemoryHistory` - Address-bar history seam
//! - `NavigationController` - Push/replace/pop navigation and server actions,
//!   with stale results from superseded navigations discarded
//! - `RouterState` / `RenderEvent` - What the render layer observes
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rsc_core::{Location, NavigatorConfig};
//! use rsc_fetch::ScriptedFetcher;
//! use rsc_navigation::{MemoryHistory, NavigateOptions, NavigationController};
//!
//! let fetcher = Arc::new(ScriptedFetcher::new().route("/", "home").route("/ships", "ships"));
//! let history = Arc::new(MemoryHistory::new(Location::root()));
//! let nav = NavigationController::start(NavigatorConfig::default(), fetcher, history)?;
//!
//! nav.subscribe(|event| println!("render {}", event.key));
//! let outcome = nav.navigate("/ships", NavigateOptions::push())?.outcome().await?;
//! ```

mod cache;
mod controller;
mod error;
mod history;
mod router;

pub use cache::*;
pub use controller::*;
pub use error::*;
pub use history::*;
pub use router::*;
