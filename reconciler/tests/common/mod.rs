//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers used across the reconciler test suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::TestHelpers;
