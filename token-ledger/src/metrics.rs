//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//! Collectors live on a private [`Registry`], so several ledgers (and tests)
//! can coexist in one process.
//!
//! # Metrics
//!
//! - `token_ledger_operations_total{op}` - Committed operations
//! - `token_ledger_rejections_total{op,kind}` - Rejected operations by error kind
//! - `token_ledger_events_total{event}` - Events appended to the log
//! - `token_ledger_operation_duration_seconds` - Histogram of operation latencies

use crate::{types::TokenEvent, Result};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Committed operations, by operation
    pub operations_total: IntCounterVec,

    /// Rejected operations, by operation and error kind
    pub rejections_total: IntCounterVec,

    /// Appended events, by event name
    pub events_total: IntCounterVec,

    /// Operation duration histogram
    pub operation_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounterVec::new(
            Opts::new("token_ledger_operations_total", "Committed ledger operations"),
            &["op"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("token_ledger_rejections_total", "Rejected ledger operations"),
            &["op", "kind"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let events_total = IntCounterVec::new(
            Opts::new("token_ledger_events_total", "Events appended to the ledger log"),
            &["event"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let operation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "token_ledger_operation_duration_seconds",
                "Histogram of operation latencies",
            )
            .buckets(vec![0.000_001, 0.000_01, 0.000_1, 0.001, 0.01, 0.1]),
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            operations_total,
            rejections_total,
            events_total,
            operation_duration,
            registry,
        })
    }

    /// Record the outcome of a mutating operation
    pub fn record_outcome(&self, op: &str, outcome: &Result<Vec<TokenEvent>>) {
        match outcome {
            Ok(events) => {
                self.operations_total.with_label_values(&[op]).inc();
                for event in events {
                    self.events_total.with_label_values(&[event.name()]).inc();
                }
            }
            Err(err) => {
                self.rejections_total
                    .with_label_values(&[op, err.kind()])
                    .inc();
            }
        }
    }

    /// Record operation duration
    pub fn record_duration(&self, duration_seconds: f64) {
        self.operation_duration.observe(duration_seconds);
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
