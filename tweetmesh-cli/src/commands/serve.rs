//! HTTP server command
//!
//! Runs one of the two services with configuration from the environment,
//! optionally overridden by flags.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use tweetmesh_server::{run_service, ServiceConfig, ServiceKind};

use super::ServiceArg;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Service to run
    #[arg(value_enum)]
    pub service: ServiceArg,

    /// Address to bind to (default: BIND_ADDR:SERVICE_PORT); its port is
    /// also the one registered with discovery
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Database URL (overrides DB_* variables)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Per-request deadline in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
}

/// Resolve the service configuration: environment first, then flags.
pub fn resolve_config(args: &ServeArgs) -> Result<ServiceConfig> {
    let kind = ServiceKind::from(args.service);
    let mut config =
        ServiceConfig::from_env(kind).context("Invalid service configuration in environment")?;

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
        config.advertised_port = bind.port();
    }
    if let Some(url) = &args.database_url {
        config.database.url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    Ok(config)
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    tracing::info!(
        service = %config.kind,
        bind = %config.bind_addr,
        registry = %config.registry.base_url(),
        "Starting tweetmesh service"
    );

    // Run server (blocks until shutdown)
    run_service(config)
        .await
        .with_context(|| format!("{} service failed", ServiceKind::from(args.service)))?;

    Ok(())
}
