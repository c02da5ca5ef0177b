//! Core reconciliation logic
//!
//! Pure cluster bookkeeping with no I/O. The resolver feeds it rows fetched
//! from a store and writes back whatever it decides.

pub mod cluster;
pub mod merge;

pub use cluster::Cluster;
pub use merge::MergePlan;
