//! Observability setup for Chatbox: the tracing subscriber and optional
//! OpenTelemetry export.

pub mod tracing_setup;
