//! Deferred-commit protocol
//!
//! ```text
//! Initial --begin--> Pending --commit-->   Committed
//!                            --rollback--> RolledBack
//!                            --expiry-->   RolledBack (reaper)
//! ```
//!
//! A begin that deletes nothing never reaches Pending: the empty transaction
//! is rolled back on the spot and no token is issued.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use super::ledger::{LedgerError, SessionToken, TransactionLedger};
use crate::db::{DbError, TweetRepo};

/// Production transaction type held by the ledger
pub type PgTransaction = Transaction<'static, Postgres>;

/// A transaction whose completion is decided by a later request
#[async_trait]
pub trait DeferredTransaction: Send + Sized + 'static {
    async fn commit(self) -> Result<(), sqlx::Error>;
    async fn rollback(self) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl DeferredTransaction for PgTransaction {
    async fn commit(self) -> Result<(), sqlx::Error> {
        Transaction::commit(self).await
    }

    async fn rollback(self) -> Result<(), sqlx::Error> {
        Transaction::rollback(self).await
    }
}

/// Terminal decision for a pending transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Commit,
    Rollback,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }
}

/// Protocol error type
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("deferred session task did not finish: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

impl From<sqlx::Error> for ProtocolError {
    fn from(e: sqlx::Error) -> Self {
        Self::Db(DbError::Sqlx(e))
    }
}

/// Outcome of the first phase of an owner deletion
#[derive(Debug, Clone, Serialize)]
pub struct DeferredDeletion {
    /// `None` when there was nothing to delete
    pub session: Option<SessionToken>,
    pub deleted: u64,
}

/// First phase: delete all tweets of `user_id` inside a fresh transaction and
/// park that transaction in the ledger.
pub async fn begin_owner_deletion(
    pool: &PgPool,
    ledger: &TransactionLedger<PgTransaction>,
    user_id: i32,
) -> Result<DeferredDeletion, ProtocolError> {
    let mut tx = pool.begin().await?;
    let deleted = TweetRepo::delete_by_owner_in(&mut *tx, user_id).await?;

    if deleted == 0 {
        tx.rollback().await?;
        tracing::debug!(user_id, "Nothing to delete, no session opened");
        return Ok(DeferredDeletion {
            session: None,
            deleted: 0,
        });
    }

    let session = ledger.open(tx);
    tracing::info!(%session, user_id, deleted, "Deferred deletion pending");

    Ok(DeferredDeletion {
        session: Some(session),
        deleted,
    })
}

/// Second phase: redeem `token` and apply `resolution` to its transaction.
///
/// The token is consumed before the database call, so a failing commit or
/// rollback still leaves the token redeemed. The terminal call runs on its own
/// task and completes even if the caller is dropped after redemption.
pub async fn resolve<T: DeferredTransaction>(
    ledger: &TransactionLedger<T>,
    token: &SessionToken,
    resolution: Resolution,
) -> Result<(), ProtocolError> {
    let tx = ledger.redeem(token)?;
    let session = *token;

    let finish = tokio::spawn(async move {
        let result = match resolution {
            Resolution::Commit => tx.commit().await,
            Resolution::Rollback => tx.rollback().await,
        };
        match &result {
            Ok(()) => {
                tracing::info!(%session, action = resolution.as_str(), "Deferred session resolved");
            }
            Err(e) => {
                tracing::error!(%session, action = resolution.as_str(), error = %e, "Deferred session failed to resolve");
            }
        }
        result
    });

    finish.await?.map_err(ProtocolError::from)
}

/// Redeem and commit.
pub async fn commit<T: DeferredTransaction>(
    ledger: &TransactionLedger<T>,
    token: &SessionToken,
) -> Result<(), ProtocolError> {
    resolve(ledger, token, Resolution::Commit).await
}

/// Redeem and roll back.
pub async fn rollback<T: DeferredTransaction>(
    ledger: &TransactionLedger<T>,
    token: &SessionToken,
) -> Result<(), ProtocolError> {
    resolve(ledger, token, Resolution::Rollback).await
}


#[cfg(test)]
mod tests {
    use super::fake::{FakeTx, Journal};
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn commit_then_anything_is_not_found() {
        let journal = Journal::default();
        let ledger = TransactionLedger::new();
        let token = ledger.open(FakeTx::new(1, &journal));

        commit(&ledger, &token).await.unwrap();

        assert!(matches!(
            rollback(&ledger, &token).await,
            Err(ProtocolError::Ledger(LedgerError::NotFound(t))) if t == token
        ));
        assert!(matches!(
            commit(&ledger, &token).await,
            Err(ProtocolError::Ledger(LedgerError::NotFound(_)))
        ));
        assert_eq!(journal.entries(), vec![(1, Resolution::Commit)]);
    }

    #[tokio::test]
    async fn rollback_reaches_the_transaction() {
        let journal = Journal::default();
        let ledger = TransactionLedger::new();
        let token = ledger.open(FakeTx::new(2, &journal));

        rollback(&ledger, &token).await.unwrap();

        assert_eq!(journal.entries(), vec![(2, Resolution::Rollback)]);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn failed_commit_still_consumes_token() {
        let journal = Journal::default();
        let ledger = TransactionLedger::new();
        let mut tx = FakeTx::new(3, &journal);
        tx.fail = true;
        let token = ledger.open(tx);

        assert!(matches!(
            commit(&ledger, &token).await,
            Err(ProtocolError::Db(DbError::Sqlx(_)))
        ));
        assert!(ledger.is_empty());
        assert!(journal.entries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_caller_does_not_abandon_redeemed_commit() {
        let journal = Journal::default();
        let ledger = TransactionLedger::new();
        let mut tx = FakeTx::new(4, &journal);
        tx.delay = std::time::Duration::from_secs(10);
        let token = ledger.open(tx);

        let abandoned =
            tokio::time::timeout(std::time::Duration::from_secs(5), commit(&ledger, &token)).await;
        assert!(abandoned.is_err());
        assert!(ledger.is_empty());

        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        assert_eq!(journal.entries(), vec![(4, Resolution::Commit)]);
        assert!(matches!(
            rollback(&ledger, &token).await,
            Err(ProtocolError::Ledger(LedgerError::NotFound(_)))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_commit_and_rollback_race() {
        for round in 0..100 {
            let journal = Journal::default();
            let ledger = Arc::new(TransactionLedger::new());
            let token = ledger.open(FakeTx::new(round, &journal));

            let committer = {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { commit(&*ledger, &token).await })
            };
            let roller = {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move { rollback(&*ledger, &token).await })
            };

            let (committed, rolled_back) = futures::future::join(committer, roller).await;
            let outcomes = [committed.unwrap(), rolled_back.unwrap()];
            let successes = outcomes.iter().filter(|r| r.is_ok()).count();
            let not_found = outcomes
                .iter()
                .filter(|r| matches!(r, Err(ProtocolError::Ledger(LedgerError::NotFound(_)))))
                .count();

            assert_eq!((successes, not_found), (1, 1), "round {}", round);
            assert_eq!(journal.entries().len(), 1);
        }
    }
}
