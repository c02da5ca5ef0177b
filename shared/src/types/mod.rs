//! Core types used throughout the identity service

pub mod contact;

pub use contact::{Contact, ContactId, LinkPrecedence, NewContact};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Identifies which process is emitting logs and traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// HTTP service hosting the `/identify` endpoint
    WebServer,
    /// Resolver linked into another program (tests, tools)
    Embedded,
}

impl ProcessId {
    /// Initialize the global process ID for the webserver
    pub fn init_webserver() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::WebServer)
    }

    /// Get the global process ID.
    ///
    /// Falls back to `Embedded` when nothing was initialized, so library code
    /// can log from tests without a startup routine.
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Embedded)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::WebServer => write!(f, "webserver"),
            ProcessId::Embedded => write!(f, "embedded"),
        }
    }
}
