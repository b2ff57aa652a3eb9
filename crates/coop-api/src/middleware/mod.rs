//! # Middleware Stack
//!
//! - [`metrics`]: request counters and latency histograms exported in
//!   Prometheus text format.
//!
//! Per-request tracing spans come from `tower_http::trace::TraceLayer`,
//! installed in [`crate::app`].

pub mod metrics;
