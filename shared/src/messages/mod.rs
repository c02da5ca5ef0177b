//! Message types exchanged between the HTTP boundary and the resolver
//!
//! - `identify`: inbound submissions and the resolved cluster view

pub mod identify;

pub use identify::{ClusterView, Submission};
