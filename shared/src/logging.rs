//! Shared logging utilities for consistent tracing across the service

use crate::types::ProcessId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{Event, Subscriber, error, info};
use tracing_subscriber::layer::Context;

/// Remote collector that receives batched trace events
#[derive(Debug, Clone)]
pub struct TracingEndpoint {
    pub url: String,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl TracingEndpoint {
    pub fn new(url: String) -> Self {
        Self {
            url,
            batch_size: 20,
            flush_interval: Duration::from_millis(500),
        }
    }
}

/// Structured trace event posted to the collector
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TraceEvent {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    pub process: String,
    pub fields: HashMap<String, serde_json::Value>,
}

/// Work items for the shipping task
enum ShipperMessage {
    Event(TraceEvent),
    /// Ship whatever is buffered, then signal completion
    Flush(oneshot::Sender<()>),
}

/// Sender of the running shipper, used by `flush_traces`
static SHIPPER: OnceLock<mpsc::UnboundedSender<ShipperMessage>> = OnceLock::new();

/// Upper bound on how long shutdown waits for the collector
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Tracing layer that ships process-tagged events to an HTTP collector
pub struct HttpTracingLayer {
    sender: mpsc::UnboundedSender<ShipperMessage>,
}

impl HttpTracingLayer {
    /// Must be called from inside a tokio runtime; spawns the shipping task
    pub fn new(endpoint: TracingEndpoint) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<ShipperMessage>();
        let client = reqwest::Client::new();
        let url = endpoint.url.clone();

        tokio::spawn(run_shipper(endpoint, rx, move |batch| {
            let client = client.clone();
            let url = url.clone();
            async move { Self::send_batch(&client, &url, batch).await }
        }));
        let _ = SHIPPER.set(tx.clone());

        HttpTracingLayer { sender: tx }
    }

    async fn send_batch(client: &reqwest::Client, url: &str, batch: Vec<TraceEvent>) {
        // Logging through tracing here would feed back into this layer
        match client.post(url).json(&batch).send().await {
            Ok(response) if !response.status().is_success() => {
                eprintln!("❌ Trace collector rejected batch: HTTP {}", response.status());
            }
            Ok(_) => {}
            Err(e) => eprintln!("❌ Failed to send trace batch: {e}"),
        }
    }
}

/// Buffer events and hand them to `ship` when the batch fills, the interval
/// elapses, a flush is requested, or the channel closes
async fn run_shipper<F, Fut>(endpoint: TracingEndpoint, mut rx: mpsc::UnboundedReceiver<ShipperMessage>, mut ship: F)
where
    F: FnMut(Vec<TraceEvent>) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut buffer = Vec::with_capacity(endpoint.batch_size);
    let mut flush_timer = tokio::time::interval_at(
        tokio::time::Instant::now() + endpoint.flush_interval,
        endpoint.flush_interval,
    );

    loop {
        tokio::select! {
            message = rx.recv() => {
                match message {
                    Some(ShipperMessage::Event(event)) => {
                        buffer.push(event);
                        if buffer.len() >= endpoint.batch_size {
                            ship(std::mem::take(&mut buffer)).await;
                        }
                    }
                    Some(ShipperMessage::Flush(done)) => {
                        if !buffer.is_empty() {
                            ship(std::mem::take(&mut buffer)).await;
                        }
                        let _ = done.send(());
                    }
                    None => {
                        if !buffer.is_empty() {
                            ship(std::mem::take(&mut buffer)).await;
                        }
                        break;
                    }
                }
            }
            _ = flush_timer.tick() => {
                if !buffer.is_empty() {
                    ship(std::mem::take(&mut buffer)).await;
                }
            }
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for HttpTracingLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut fields = HashMap::new();
        let mut message = String::new();

        event.record(&mut TraceVisitor {
            message: &mut message,
            fields: &mut fields,
        });

        // Only events emitted through the process_* macros are shipped
        if !fields.contains_key("process") {
            return;
        }

        let _ = self.sender.send(ShipperMessage::Event(TraceEvent {
            timestamp: Utc::now(),
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message,
            process: ProcessId::current().to_string(),
            fields,
        }));
    }
}

/// Visitor to extract event fields and message
struct TraceVisitor<'a> {
    message: &'a mut String,
    fields: &'a mut HashMap<String, serde_json::Value>,
}

impl tracing::field::Visit for TraceVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message.push_str(&format!("{value:?}"));
        } else {
            self.fields.insert(
                field.name().to_string(),
                serde_json::Value::String(format!("{value:?}")),
            );
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.fields
                .insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields
            .insert(field.name().to_string(), serde_json::Value::Bool(value));
    }
}

/// Per-process filter directives at the given base level
pub fn filter_directives(process_id: &ProcessId, base_level: &str) -> String {
    match process_id {
        ProcessId::WebServer => format!(
            "webserver={base_level},reconciler={base_level},shared={base_level},tower_http=debug,axum={base_level},sqlx=warn"
        ),
        ProcessId::Embedded => format!("reconciler={base_level},shared={base_level}"),
    }
}

/// Initialize tracing with stdout output and an optional HTTP collector
pub fn init_tracing_with_endpoint_and_level(endpoint: Option<TracingEndpoint>, log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let directives = filter_directives(ProcessId::current(), log_level.unwrap_or("info"));
    println!("📊 Log level: {directives}");

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::new(&directives))
        .with(fmt_layer);

    // try_init so repeated initialization in tests is harmless
    match endpoint {
        Some(endpoint) => {
            println!("📡 Tracing endpoint configured: {}", endpoint.url);
            let _ = registry.with(HttpTracingLayer::new(endpoint)).try_init();
        }
        None => {
            let _ = registry.try_init();
        }
    }
}

/// Ship every buffered event to the collector before exit.
///
/// Returns immediately when no collector is configured.
pub async fn flush_traces() {
    let Some(sender) = SHIPPER.get() else {
        return;
    };

    info!(
        process = %ProcessId::current(),
        timestamp = format_timestamp(),
        "Flushing traces before shutdown"
    );

    let (done_tx, done_rx) = oneshot::channel();
    if sender.send(ShipperMessage::Flush(done_tx)).is_err() {
        return;
    }
    if tokio::time::timeout(FLUSH_TIMEOUT, done_rx).await.is_err() {
        eprintln!("⚠️ Timed out flushing traces after {FLUSH_TIMEOUT:?}");
    }
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for process-aware info logging
#[macro_export]
macro_rules! process_info {
    ($process_id:expr, $($arg:tt)*) => {
        tracing::info!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware warning logging
#[macro_export]
macro_rules! process_warn {
    ($process_id:expr, $($arg:tt)*) => {
        tracing::warn!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware error logging
#[macro_export]
macro_rules! process_error {
    ($process_id:expr, $($arg:tt)*) => {
        tracing::error!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware debug logging
#[macro_export]
macro_rules! process_debug {
    ($process_id:expr, $($arg:tt)*) => {
        tracing::debug!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

pub fn log_startup(process_id: &ProcessId, details: &str) {
    info!(
        process = %process_id,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

pub fn log_shutdown(process_id: &ProcessId, reason: &str) {
    info!(
        process = %process_id,
        timestamp = format_timestamp(),
        "🛑 Shutting down: {}",
        reason
    );
}

pub fn log_error(process_id: &ProcessId, context: &str, error: &dyn std::fmt::Display) {
    error!(
        process = %process_id,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

pub fn log_success(process_id: &ProcessId, message: &str) {
    info!(
        process = %process_id,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}
