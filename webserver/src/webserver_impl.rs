//! Main webserver implementation
//!
//! `WebServer` owns the resolver and the server bookkeeping, builds the axum
//! router and serves it until the shutdown future resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    response::Json,
    routing::{get, post},
};
use chrono::Utc;
use reconciler::{ContactStore, IdentityResolver};
use shared::{ProcessId, Submission, logging, process_debug, process_info};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::error::{WebServerError, WebServerResult};
use crate::state::WebServerState;
use crate::types::{HealthResponse, IdentifyRequest, IdentifyResponse};

/// HTTP server around an `IdentityResolver`
pub struct WebServer<S>
where
    S: ContactStore + Send + Sync + 'static,
{
    state: Arc<WebServerState>,
    resolver: Arc<IdentityResolver<S>>,
}

impl<S> Clone for WebServer<S>
where
    S: ContactStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S> WebServer<S>
where
    S: ContactStore + Send + Sync + 'static,
{
    pub fn new(bind_address: SocketAddr, resolver: IdentityResolver<S>) -> Self {
        Self {
            state: Arc::new(WebServerState::new(bind_address)),
            resolver: Arc::new(resolver),
        }
    }

    /// Build the Axum router with all routes
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/identify", post(identify_handler::<S>))
            .route("/health", get(health_check::<S>))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()).into_inner())
            .with_state(self.clone())
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> WebServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let bind_address = self.state.bind_address;

        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .map_err(|e| WebServerError::ServerStartup(format!("Failed to bind to {}: {}", bind_address, e)))?;

        logging::log_startup(ProcessId::current(), &format!("identity service on http://{}", bind_address));

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| WebServerError::ServerStartup(format!("Server error: {}", e)))?;

        process_info!(
            ProcessId::current(),
            served = self.state.requests_served(),
            failed = self.state.requests_failed(),
            "📊 Served {} identify requests ({} failed)",
            self.state.requests_served(),
            self.state.requests_failed()
        );
        Ok(())
    }

    pub fn state(&self) -> &Arc<WebServerState> {
        &self.state
    }

    pub fn resolver(&self) -> &Arc<IdentityResolver<S>> {
        &self.resolver
    }
}

// HTTP Handlers

/// Resolve the submitted contact details to their consolidated identity
async fn identify_handler<S>(
    State(webserver): State<WebServer<S>>,
    payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> WebServerResult<Json<IdentifyResponse>>
where
    S: ContactStore + Send + Sync + 'static,
{
    let request_id = Uuid::new_v4();
    let result = identify(&webserver, payload).await;

    webserver.state.record_request(result.is_ok());
    process_debug!(
        ProcessId::current(),
        request_id = %request_id,
        ok = result.is_ok(),
        "POST /identify handled"
    );
    result
}

async fn identify<S>(
    webserver: &WebServer<S>,
    payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> WebServerResult<Json<IdentifyResponse>>
where
    S: ContactStore + Send + Sync + 'static,
{
    let Json(request) = payload.map_err(|rejection| WebServerError::InvalidRequest {
        details: rejection.body_text(),
    })?;

    let submission = Submission::from(request);
    let view = webserver.resolver.resolve(&submission).await?;

    Ok(Json(IdentifyResponse { contact: view.into() }))
}

/// Health check endpoint
async fn health_check<S>(State(webserver): State<WebServer<S>>) -> Json<HealthResponse>
where
    S: ContactStore + Send + Sync + 'static,
{
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().timestamp(),
        uptime: webserver.state.get_uptime_seconds(),
    })
}
