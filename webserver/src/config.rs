//! Command line and environment configuration

use std::net::SocketAddr;

use clap::Parser;
use reconciler::ResolverConfig;

use crate::error::{WebServerError, WebServerResult};

/// Startup options; every flag can also come from the environment or `.env`
#[derive(Parser, Debug, Clone)]
#[command(name = "webserver")]
#[command(about = "Identity reconciliation HTTP service")]
pub struct Args {
    /// Interface to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for HTTP server
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// PostgreSQL connection string; without it contacts live in memory
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Connection pool size for the PostgreSQL store
    #[arg(long, env = "MAX_CONNECTIONS", default_value = "5")]
    pub max_connections: u32,

    /// Expansion rounds allowed before a cluster is declared inconsistent
    #[arg(long, env = "CLOSURE_ROUND_LIMIT", default_value_t = ResolverConfig::DEFAULT_CLOSURE_ROUND_LIMIT)]
    pub closure_round_limit: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Tracing endpoint URL (if set, traces will be sent here)
    #[arg(long, env = "TRACE_EP")]
    pub trace_ep: Option<String>,
}

impl Args {
    pub fn bind_address(&self) -> WebServerResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| WebServerError::config(format!("Invalid bind address {}:{}: {}", self.host, self.port, e)))
    }

    pub fn resolver_config(&self) -> WebServerResult<ResolverConfig> {
        if self.closure_round_limit == 0 {
            return Err(WebServerError::config("closure round limit must be at least 1"));
        }
        Ok(ResolverConfig {
            closure_round_limit: self.closure_round_limit,
        })
    }
}
