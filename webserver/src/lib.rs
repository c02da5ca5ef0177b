//! HTTP front end for the identity reconciliation service
//!
//! Exposes `POST /identify` over an `IdentityResolver` and a `GET /health`
//! probe. The store behind the resolver is chosen at startup.

pub mod config;
pub mod error;
pub mod state;
pub mod types;
pub mod webserver_impl;

// Re-export main types
pub use config::Args;
pub use error::{WebServerError, WebServerResult};
pub use state::WebServerState;
pub use types::*;
pub use webserver_impl::WebServer;
