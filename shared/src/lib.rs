//! Shared types for the identity reconciliation service
//!
//! Holds the contact data model, the identify messages passed between the
//! HTTP boundary and the resolver, and process-wide logging setup.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{ClusterView, Submission};
