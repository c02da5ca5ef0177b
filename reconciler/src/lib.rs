//! Identity reconciliation library
//!
//! Clusters contact submissions (email, phone number) into one identity per
//! person. Persistence sits behind the `ContactStore` trait; the cluster
//! bookkeeping in `core` is pure and the `IdentityResolver` drives it inside
//! one store transaction per submission.

pub mod core;
pub mod error;
pub mod resolver;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use core::{Cluster, MergePlan};
pub use error::{ReconcilerError, ReconcilerResult};
pub use resolver::{IdentityResolver, Resolution, ResolutionOutcome, ResolverConfig};
pub use services::InMemoryContactStore;
#[cfg(feature = "postgres")]
pub use services::PostgresContactStore;
pub use traits::{ContactQuery, ContactStore, ContactTransaction};
