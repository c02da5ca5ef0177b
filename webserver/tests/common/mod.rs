//! Common test utilities for webserver integration tests

#![allow(dead_code)]

pub mod helpers;

pub use helpers::TestHelpers;
