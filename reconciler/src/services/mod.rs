//! Service implementations
//!
//! Concrete `ContactStore` implementations used in production and tests.

pub mod memory_store;
#[cfg(feature = "postgres")]
pub mod postgres_store;

#[cfg(test)]
mod tests;

pub use memory_store::{InMemoryContactStore, InMemoryTransaction};
#[cfg(feature = "postgres")]
pub use postgres_store::{PostgresContactStore, PostgresTransaction};
