//! Command implementations for the tweetmesh CLI

pub mod config;
pub mod serve;

pub use config::run_config;
pub use serve::run_serve;

use clap::ValueEnum;
use tweetmesh_server::ServiceKind;

/// Service selector shared by every subcommand
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceArg {
    /// Tweets, timelines and deferred deletions (registers as `tweet`)
    Content,
    /// Users and follow edges (registers as `user`)
    Social,
}

impl From<ServiceArg> for ServiceKind {
    fn from(arg: ServiceArg) -> Self {
        match arg {
            ServiceArg::Content => ServiceKind::Content,
            ServiceArg::Social => ServiceKind::Social,
        }
    }
}
