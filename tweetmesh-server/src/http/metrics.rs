//! Prometheus metrics owned by one service process
//!
//! - `http_requests_total{code}`: completed requests by final status
//! - `deferred_sessions_expired_total`: sessions force-rolled back by the reaper (content)
//! - `deferred_sessions_pending`: sessions awaiting commit or rollback (content)

use std::sync::{Mutex, PoisonError};

use prometheus::core::Collector;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::config::ServiceKind;
use crate::txn::TransactionLedger;

const REQUESTS_TOTAL: &str = "http_requests_total";

fn requests_total() -> Result<IntCounterVec, prometheus::Error> {
    IntCounterVec::new(
        Opts::new(REQUESTS_TOTAL, "The total number of HTTP requests."),
        &["code"],
    )
}

struct DeferredMetrics {
    expired_total: IntCounter,
    pending: IntGauge,
    // Serializes catching the counter up with the ledger
    sync: Mutex<()>,
}

/// Metric registry plus typed handles
pub struct ServiceMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    deferred: Option<DeferredMetrics>,
}

impl std::fmt::Debug for ServiceMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMetrics")
            .field("deferred", &self.deferred.is_some())
            .finish_non_exhaustive()
    }
}

impl ServiceMetrics {
    /// Register the metric families `kind` exposes.
    pub fn new(kind: ServiceKind) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = requests_total()?;
        registry.register(Box::new(requests_total.clone()))?;

        let deferred = match kind {
            ServiceKind::Content => {
                let expired_total = IntCounter::with_opts(Opts::new(
                    "deferred_sessions_expired_total",
                    "Deferred sessions rolled back after exceeding their maximum age.",
                ))?;
                let pending = IntGauge::with_opts(Opts::new(
                    "deferred_sessions_pending",
                    "Deferred sessions awaiting commit or rollback.",
                ))?;
                registry.register(Box::new(expired_total.clone()))?;
                registry.register(Box::new(pending.clone()))?;
                Some(DeferredMetrics {
                    expired_total,
                    pending,
                    sync: Mutex::new(()),
                })
            }
            ServiceKind::Social => None,
        };

        Ok(Self {
            registry,
            requests_total,
            deferred,
        })
    }

    /// Count one completed request.
    pub fn record(&self, code: u16) {
        let code = code.to_string();
        self.requests_total.with_label_values(&[code.as_str()]).inc();
    }

    /// Completed requests per status code, codes ascending.
    pub fn requests_by_code(&self) -> Vec<(u16, u64)> {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == REQUESTS_TOTAL)
            .flat_map(|family| family.get_metric().iter())
            .filter_map(|metric| {
                let code = metric.get_label().first()?.get_value().parse().ok()?;
                Some((code, metric.get_counter().get_value() as u64))
            })
            .collect()
    }

    /// Bring the deferred-session metrics up to date with `ledger`.
    pub fn observe_ledger<T>(&self, ledger: &TransactionLedger<T>) {
        let Some(deferred) = &self.deferred else {
            return;
        };
        let _guard = deferred.sync.lock().unwrap_or_else(PoisonError::into_inner);

        let total = ledger.expired_total();
        let seen = deferred.expired_total.get();
        if total > seen {
            deferred.expired_total.inc_by(total - seen);
        }
        deferred.pending.set(ledger.len() as i64);
    }

    /// Encode every family in the Prometheus text format.
    ///
    /// Until a request has been counted, `http_requests_total` is reported as
    /// a single `code="200"` sample with value 0.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut families = self.registry.gather();
        families.retain(|family| !family.get_metric().is_empty());

        if !families.iter().any(|family| family.get_name() == REQUESTS_TOTAL) {
            let placeholder = requests_total()?;
            placeholder.with_label_values(&["200"]);
            families.extend(placeholder.collect());
        }
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        TextEncoder::new().encode_to_string(&families)
    }
}
