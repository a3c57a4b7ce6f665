//! Prometheus metrics collection for chatrelay.
//!
//! Exposed on the optional HTTP endpoint (see `http`). Recording helpers are
//! no-ops until `init()` has run, so library code and tests never need the
//! registry to exist.
//!
//! - `chat_sessions_connected` - Accepted connections still open (gauge)
//! - `chat_sessions_registered` - Sessions past the nickname prompt (gauge)
//! - `chat_messages_sent_total` - Lines written to client streams
//! - `chat_message_fanout` - Recipients per broadcast (histogram)
//! - `chat_delivery_failures_total{reason}` - Messages a queue did not accept
//! - `chat_command_total{command}` / `chat_command_duration_seconds{command}`

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Lines successfully written to client streams.
pub static MESSAGES_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Chat lines accepted from clients and relayed.
pub static CHAT_LINES: OnceLock<IntCounter> = OnceLock::new();

/// Messages not accepted by a subscriber queue, by reason.
pub static DELIVERY_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// History append/read failures, by operation.
pub static HISTORY_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Sessions ended, by reason.
pub static SESSIONS_CLOSED: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

pub static CONNECTED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

pub static REGISTERED_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Command metrics
// ========================================================================

pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Recipients per broadcast.
pub static MESSAGE_FANOUT: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before metrics are scraped.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(MESSAGES_SENT, IntCounter::new("chat_messages_sent_total", "Lines written to client streams"));
    register!(CHAT_LINES, IntCounter::new("chat_lines_relayed_total", "Chat lines relayed from clients"));
    register!(DELIVERY_FAILURES, IntCounterVec::new(Opts::new("chat_delivery_failures_total", "Messages not accepted by a subscriber queue"), &["reason"]));
    register!(HISTORY_FAILURES, IntCounterVec::new(Opts::new("chat_history_failures_total", "History store failures"), &["operation"]));
    register!(SESSIONS_CLOSED, IntCounterVec::new(Opts::new("chat_sessions_closed_total", "Sessions ended by reason"), &["reason"]));
    register!(CONNECTED_SESSIONS, IntGauge::new("chat_sessions_connected", "Open client connections"));
    register!(REGISTERED_SESSIONS, IntGauge::new("chat_sessions_registered", "Sessions with a nickname"));

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("chat_command_total", "Chat commands processed by name"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("chat_command_duration_seconds", "Chat command latency by name")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("chat_command_errors_total", "Chat command errors"), &["command", "error"]));
    register!(MESSAGE_FANOUT, Histogram::with_opts(
        HistogramOpts::new("chat_message_fanout", "Recipients per broadcast")
            .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0])));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

#[inline]
fn inc_labeled(metric: &OnceLock<IntCounterVec>, labels: &[&str]) {
    if let Some(c) = metric.get() {
        c.with_label_values(labels).inc();
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    inc_labeled(&COMMAND_COUNTER, &[command]);
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

#[inline]
pub fn record_command_error(command: &str, error: &str) {
    inc_labeled(&COMMAND_ERRORS, &[command, error]);
}

/// Record how many subscribers accepted one broadcast.
#[inline]
pub fn record_fanout(recipients: usize) {
    if let Some(h) = MESSAGE_FANOUT.get() {
        h.observe(recipients as f64);
    }
}

#[inline]
pub fn record_message_sent() {
    if let Some(c) = MESSAGES_SENT.get() {
        c.inc();
    }
}

#[inline]
pub fn record_chat_line() {
    if let Some(c) = CHAT_LINES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_delivery_failure(reason: &str) {
    inc_labeled(&DELIVERY_FAILURES, &[reason]);
}

#[inline]
pub fn record_history_failure(operation: &str) {
    inc_labeled(&HISTORY_FAILURES, &[operation]);
}

#[inline]
pub fn record_session_closed(reason: &str) {
    inc_labeled(&SESSIONS_CLOSED, &[reason]);
}

#[inline]
pub fn session_connected() {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn session_disconnected() {
    if let Some(g) = CONNECTED_SESSIONS.get() {
        g.dec();
    }
}

#[inline]
pub fn session_registered() {
    if let Some(g) = REGISTERED_SESSIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn session_unregistered() {
    if let Some(g) = REGISTERED_SESSIONS.get() {
        g.dec();
    }
}
