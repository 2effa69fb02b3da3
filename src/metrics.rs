//! Prometheus metrics for hubbot.
//!
//! - `hubbot_events_total{kind}` - Inbound gateway events by kind
//! - `hubbot_command_total{extension,command}` - Commands dispatched
//! - `hubbot_command_duration_seconds{extension,command}` - Handler latency
//! - `hubbot_command_errors_total{extension,error}` - Handler failures and scan misses
//! - `hubbot_tenant_persist_failures_total{extension,op}` - Tenant load/save failures
//!
//! Recording before [`init`] is a silent no-op, which keeps unit tests free
//! of global setup.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Inbound events by kind.
pub static EVENTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Commands dispatched, by extension and keyword.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command handler latency.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by extension and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

pub static PERSIST_FAILURES: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup. Later calls leave the first registration in place.
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

    register!(EVENTS, IntCounterVec::new(Opts::new("hubbot_events_total", "Gateway events received by kind"), &["kind"]));
    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("hubbot_command_total", "Commands dispatched"), &["extension", "command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("hubbot_command_duration_seconds", "Command handler latency")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["extension", "command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("hubbot_command_errors_total", "Command errors by kind"), &["extension", "error"]));
    register!(PERSIST_FAILURES, IntCounterVec::new(Opts::new("hubbot_tenant_persist_failures_total", "Tenant config load/save failures"), &["extension", "op"]));
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

/// Record an inbound event.
#[inline]
pub fn record_event(kind: &str) {
    if let Some(c) = EVENTS.get() {
        c.with_label_values(&[kind]).inc();
    }
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(extension: &str, command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[extension, command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[extension, command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(extension: &str, error: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[extension, error]).inc();
    }
}

/// Record a failed tenant load, save or listing.
#[inline]
pub fn record_persist_failure(extension: &str, op: &str) {
    if let Some(c) = PERSIST_FAILURES.get() {
        c.with_label_values(&[extension, op]).inc();
    }
}
