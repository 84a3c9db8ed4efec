//! Cross-request transaction coordination
//!
//! - `ledger`: token -> open transaction table
//! - `protocol`: begin / commit / rollback over the ledger
//! - `reaper`: forced rollback of sessions past their maximum lifetime

pub mod ledger;
pub mod protocol;
pub mod reaper;

pub use ledger::{LedgerError, PendingInfo, SessionToken, TransactionLedger};
pub use protocol::{
    begin_owner_deletion, DeferredDeletion, DeferredTransaction, PgTransaction, ProtocolError,
    Resolution,
};
pub use reaper::ReaperConfig;
