//! Structured logging for engine components
//!
//! Every engine log line carries a `component` field (`orchestrator`,
//! `health_monitor`, `module:seo`, ...). Optionally, component-tagged events are
//! also batched and posted as JSON to a remote trace collector.

use crate::types::ComponentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Name reported in exported trace events
pub const SERVICE_NAME: &str = "growth-orchestrator";

/// Remote trace collector settings
#[derive(Debug, Clone)]
pub struct TracingEndpoint {
    pub url: String,
    /// Events per POST
    pub batch_size: usize,
    /// Partial batches are flushed at least this often
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

/// One exported event
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub service: String,
    pub component: String,
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    pub fields: Map<String, Value>,
}

/// Buffers events and posts them in batches
struct TraceExporter {
    client: reqwest::Client,
    url: String,
    batch_size: usize,
    pending: Vec<TraceEvent>,
}

impl TraceExporter {
    fn new(endpoint: &TracingEndpoint) -> Self {
        let batch_size = endpoint.batch_size.max(1);
        Self {
            client: reqwest::Client::new(),
            url: endpoint.url.clone(),
            batch_size,
            pending: Vec::with_capacity(batch_size),
        }
    }

    async fn push(&mut self, event: TraceEvent) {
        self.pending.push(event);
        if self.pending.len() >= self.batch_size {
            self.flush().await;
        }
    }

    async fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.pending);

        // Logging from inside the layer would recurse; stderr only
        match self.client.post(&self.url).json(&batch).send().await {
            Ok(response) if !response.status().is_success() => {
                eprintln!("trace export to {} rejected: HTTP {}", self.url, response.status());
            }
            Ok(_) => {}
            Err(e) => eprintln!("trace export to {} failed: {e}", self.url),
        }
    }

    async fn run(mut self, mut events: mpsc::UnboundedReceiver<TraceEvent>, flush_interval: Duration) {
        let mut ticker = tokio::time::interval(flush_interval);
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.push(event).await,
                    None => break,
                },
                _ = ticker.tick() => self.flush().await,
            }
        }
        self.flush().await;
    }
}

/// Layer forwarding component-tagged events to a [`TraceExporter`] task
pub struct HttpTracingLayer {
    sender: mpsc::UnboundedSender<TraceEvent>,
}

impl HttpTracingLayer {
    /// Spawns the exporter task, so this must run inside a tokio runtime
    pub fn new(endpoint: TracingEndpoint) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let exporter = TraceExporter::new(&endpoint);
        tokio::spawn(exporter.run(receiver, endpoint.flush_interval));
        Self { sender }
    }
}

impl<S> tracing_subscriber::Layer<S> for HttpTracingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut collected = FieldCollector::default();
        event.record(&mut collected);

        // Events that did not go through the component macros stay local
        let Some(Value::String(component)) = collected.fields.remove("component") else {
            return;
        };

        let metadata = event.metadata();
        let _ = self.sender.send(TraceEvent {
            service: SERVICE_NAME.to_string(),
            component,
            timestamp: Utc::now(),
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message: collected.message,
            fields: collected.fields,
        });
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            ("message", Value::String(text)) => self.message.push_str(&text),
            (name, value) => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }
}

/// `RUST_LOG` wins when set; otherwise engine crates log at `log_level`
fn level_filter(log_level: Option<&str>) -> String {
    let level = log_level.unwrap_or("info");
    format!("growth_orchestrator={level},shared={level},reqwest=warn,hyper=warn")
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_tracing_with_endpoint_and_level(endpoint: Option<TracingEndpoint>, log_level: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_filter(log_level)));
    let fmt_layer = fmt::layer()
        .with_target(endpoint.is_some())
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(endpoint.map(HttpTracingLayer::new))
        .with(fmt_layer)
        .try_init();
}

pub fn init_tracing() {
    init_tracing_with_endpoint_and_level(None, None);
}

/// Wall-clock time of day with milliseconds, attached to every component event
pub fn format_timestamp() -> String {
    Utc::now().format("%H:%M:%S%.3f").to_string()
}

#[doc(hidden)]
#[macro_export]
macro_rules! component_event {
    ($level:expr, $component:expr, $($arg:tt)*) => {
        tracing::event!(
            $level,
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        )
    };
}

#[macro_export]
macro_rules! component_info {
    ($component:expr, $($arg:tt)*) => {
        $crate::component_event!(tracing::Level::INFO, $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_warn {
    ($component:expr, $($arg:tt)*) => {
        $crate::component_event!(tracing::Level::WARN, $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_error {
    ($component:expr, $($arg:tt)*) => {
        $crate::component_event!(tracing::Level::ERROR, $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! component_debug {
    ($component:expr, $($arg:tt)*) => {
        $crate::component_event!(tracing::Level::DEBUG, $component, $($arg)*)
    };
}

pub fn log_startup(component: ComponentId, details: &str) {
    crate::component_info!(component, "🚀 Starting {}", details);
}

pub fn log_shutdown(component: ComponentId, reason: &str) {
    crate::component_info!(component, "🛑 Shutting down: {}", reason);
}

pub fn log_error(component: ComponentId, context: &str, error: &dyn std::fmt::Display) {
    crate::component_error!(component, error = %error, "❌ {} failed", context);
}

pub fn log_success(component: ComponentId, message: &str) {
    crate::component_info!(component, "✅ {}", message);
}
