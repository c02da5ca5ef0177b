//! WebServer process entry point
//!
//! Loads `.env`, parses flags, picks the contact store and serves the
//! identity API until Ctrl+C.

use clap::Parser;
use reconciler::{ContactStore, IdentityResolver, InMemoryContactStore, ResolverConfig};
use shared::{ProcessId, logging, process_info, process_warn};
use tokio::signal;

use webserver::{Args, WebServer, WebServerResult};

#[tokio::main]
async fn main() -> WebServerResult<()> {
    // A missing .env file is fine
    let dotenv_result = dotenv::dotenv();

    let args = Args::parse();

    // Initialize process ID singleton for webserver
    ProcessId::init_webserver();

    let trace_endpoint = args
        .trace_ep
        .as_ref()
        .map(|url| logging::TracingEndpoint::new(url.clone()));
    logging::init_tracing_with_endpoint_and_level(trace_endpoint, Some(&args.log_level));

    if let Ok(path) = dotenv_result {
        process_info!(ProcessId::current(), "📄 Loaded environment from {}", path.display());
    }

    let bind_address = args.bind_address()?;
    let resolver_config = args.resolver_config()?;

    let result = match args.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        Some(database_url) => {
            let store = reconciler::PostgresContactStore::connect(database_url, args.max_connections).await?;
            store.ensure_schema().await?;
            process_info!(
                ProcessId::current(),
                "🐘 Using PostgreSQL contact store ({} connections)",
                args.max_connections
            );
            serve(bind_address, store, resolver_config).await
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => {
            return Err(webserver::WebServerError::config(
                "DATABASE_URL is set but this build has no PostgreSQL support; rebuild with --features postgres",
            ));
        }
        None => {
            process_warn!(
                ProcessId::current(),
                "💾 No database configured, contacts are kept in memory and lost on exit"
            );
            serve(bind_address, InMemoryContactStore::new(), resolver_config).await
        }
    };

    match &result {
        Ok(()) => logging::log_success(ProcessId::current(), "WebServer stopped gracefully"),
        Err(err) => logging::log_error(ProcessId::current(), "WebServer", err),
    }
    logging::flush_traces().await;
    result
}

async fn serve<S>(bind_address: std::net::SocketAddr, store: S, config: ResolverConfig) -> WebServerResult<()>
where
    S: ContactStore + Send + Sync + 'static,
{
    let webserver = WebServer::new(bind_address, IdentityResolver::with_config(store, config));
    webserver.run(shutdown_signal()).await
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => logging::log_shutdown(ProcessId::current(), "Received Ctrl+C signal"),
        Err(err) => {
            logging::log_error(ProcessId::current(), "Signal handling", &err);
            std::future::pending::<()>().await;
        }
    }
}
