//! Core abstractions for the streamed-content navigation runtime.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Location` - Validated path + query string
//! - `NavigationKey` / `NavigationToken` - History keys and supersession tokens
//! - `NavigationPhase` - Navigation lifecycle tracking
//! - `NavigatorConfig` - Runtime configuration

mod config;
mod key;
mod lifecycle;
mod location;

pub use config::*;
pub use key::*;
pub use lifecycle::*;
pub use location::*;
