//! Forced rollback of deferred transactions that outlive their lifetime

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::ledger::TransactionLedger;
use super::protocol::DeferredTransaction;

/// Reaper schedule
#[derive(Debug, Clone, Copy)]
pub struct ReaperConfig {
    /// Pending transactions at least this old are rolled back
    pub max_age: Duration,
    /// Time between sweeps (non-zero; `ServiceConfig` rejects 0)
    pub interval: Duration,
}

/// Roll back every pending transaction older than `max_age`.
///
/// Returns the number of sessions expired by this sweep.
pub async fn sweep<T: DeferredTransaction>(ledger: &TransactionLedger<T>, max_age: Duration) -> usize {
    let expired = ledger.take_expired(max_age);
    let count = expired.len();

    for (token, tx) in expired {
        tracing::warn!(
            session = %token,
            max_age_secs = max_age.as_secs(),
            "Deferred session expired without commit or rollback; rolling back"
        );
        if let Err(e) = tx.rollback().await {
            tracing::error!(session = %token, error = %e, "Rollback of expired session failed");
        }
    }

    count
}

/// Roll back everything still pending (shutdown path).
pub async fn drain<T: DeferredTransaction>(ledger: &TransactionLedger<T>) -> usize {
    let pending = ledger.drain();
    let count = pending.len();

    for (token, tx) in pending {
        tracing::warn!(session = %token, "Rolling back pending session at shutdown");
        if let Err(e) = tx.rollback().await {
            tracing::error!(session = %token, error = %e, "Rollback at shutdown failed");
        }
    }

    count
}

/// Start the periodic sweep on the current runtime.
pub fn spawn<T: DeferredTransaction>(
    ledger: Arc<TransactionLedger<T>>,
    config: ReaperConfig,
) -> JoinHandle<()> {
    tracing::info!(
        max_age_secs = config.max_age.as_secs(),
        interval_secs = config.interval.as_secs(),
        "Deferred session reaper started"
    );

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let expired = sweep(&ledger, config.max_age).await;
            if expired > 0 {
                tracing::debug!(expired, pending = ledger.len(), "Reaper sweep finished");
            }
        }
    })
}
