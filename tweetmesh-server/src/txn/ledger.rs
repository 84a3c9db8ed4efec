//! Transaction ledger - session token to open transaction table
//!
//! The ledger owns every pending transaction from `open` until exactly one of
//! `redeem` or `take_expired` hands it back out. All operations take a single
//! mutex for the duration of a map operation; the lock is never held across
//! an `.await`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Opaque handle for one pending transaction (random UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn mint() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Serialize for SessionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ledger error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Token was never issued or has already been redeemed
    #[error("session '{0}' not found")]
    NotFound(SessionToken),
}

/// Observability view of one pending entry
#[derive(Debug, Clone, Serialize)]
pub struct PendingInfo {
    pub token: SessionToken,
    pub opened_at: DateTime<Utc>,
    pub age_secs: u64,
}

struct Entry<T> {
    tx: T,
    opened_at: DateTime<Utc>,
    opened: Instant,
}

/// In-memory table of open, uncommitted transactions
pub struct TransactionLedger<T> {
    entries: Mutex<HashMap<SessionToken, Entry<T>>>,
    expired_total: AtomicU64,
}

impl<T> TransactionLedger<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expired_total: AtomicU64::new(0),
        }
    }

    // Every critical section is a single map operation, so a poisoned
    // lock still guards a consistent map.
    fn entries(&self) -> MutexGuard<'_, HashMap<SessionToken, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take ownership of `tx` and return the token that redeems it.
    pub fn open(&self, tx: T) -> SessionToken {
        let mut entries = self.entries();
        let mut token = SessionToken::mint();
        while entries.contains_key(&token) {
            token = SessionToken::mint();
        }
        entries.insert(
            token,
            Entry {
                tx,
                opened_at: Utc::now(),
                opened: Instant::now(),
            },
        );
        token
    }

    /// Remove and return the transaction for `token`.
    ///
    /// Exactly-once: of any number of concurrent calls with the same token,
    /// one receives the transaction and the rest see `NotFound`.
    pub fn redeem(&self, token: &SessionToken) -> Result<T, LedgerError> {
        self.entries()
            .remove(token)
            .map(|entry| entry.tx)
            .ok_or(LedgerError::NotFound(*token))
    }

    /// All currently pending tokens.
    pub fn list(&self) -> Vec<SessionToken> {
        let mut tokens: Vec<_> = self.entries().keys().copied().collect();
        tokens.sort();
        tokens
    }

    /// Pending tokens with their age, oldest first.
    pub fn pending(&self) -> Vec<PendingInfo> {
        let now = Instant::now();
        let mut infos: Vec<_> = self
            .entries()
            .iter()
            .map(|(token, entry)| PendingInfo {
                token: *token,
                opened_at: entry.opened_at,
                age_secs: now.saturating_duration_since(entry.opened).as_secs(),
            })
            .collect();
        infos.sort_by_key(|info| (info.opened_at, info.token));
        infos
    }

    /// Remove every entry older than `max_age` and return them.
    pub fn take_expired(&self, max_age: Duration) -> Vec<(SessionToken, T)> {
        self.take_expired_at(Instant::now(), max_age)
    }

    /// Same as [`take_expired`](Self::take_expired) with an explicit clock.
    pub fn take_expired_at(&self, now: Instant, max_age: Duration) -> Vec<(SessionToken, T)> {
        let expired: Vec<_> = {
            let mut entries = self.entries();
            let stale: Vec<SessionToken> = entries
                .iter()
                .filter(|(_, entry)| now.saturating_duration_since(entry.opened) >= max_age)
                .map(|(token, _)| *token)
                .collect();
            stale
                .into_iter()
                .filter_map(|token| entries.remove(&token).map(|entry| (token, entry.tx)))
                .collect()
        };
        self.expired_total
            .fetch_add(expired.len() as u64, Ordering::Relaxed);
        expired
    }

    /// Remove and return everything (used at shutdown).
    pub fn drain(&self) -> Vec<(SessionToken, T)> {
        self.entries()
            .drain()
            .map(|(token, entry)| (token, entry.tx))
            .collect()
    }

    /// Number of transactions forced out by expiry since process start.
    pub fn expired_total(&self) -> u64 {
        self.expired_total.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TransactionLedger<T> {
    fn default() -> Self {
        Self::new()
    }
}
