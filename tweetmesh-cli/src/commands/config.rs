//! Print the configuration a service would start with

use anyhow::{Context, Result};
use clap::Parser;

use tweetmesh_server::{ServiceConfig, ServiceKind};

use super::ServiceArg;

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Service whose configuration to show
    #[arg(value_enum)]
    pub service: ServiceArg,
}

/// Hide the password part of a connection URL.
fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_owned();
    };
    let Some(at) = url.rfind('@').filter(|at| *at > scheme_end) else {
        return url.to_owned();
    };

    let userinfo = &url[scheme_end..at];
    match userinfo.find(':') {
        Some(colon) => format!(
            "{}{}:****{}",
            &url[..scheme_end],
            &userinfo[..colon],
            &url[at..]
        ),
        None => url.to_owned(),
    }
}

fn render(config: &ServiceConfig) -> String {
    [
        format!("service            = {}", config.kind),
        format!("service_type       = {}", config.kind.service_type()),
        format!("bind_addr          = {}", config.bind_addr),
        format!(
            "advertised         = {}:{}",
            config.advertised_host, config.advertised_port
        ),
        format!("database_url       = {}", redact_url(&config.database.url)),
        format!("db_max_connections = {}", config.database.max_connections),
        format!("registry           = {}", config.registry.base_url()),
        format!("request_timeout    = {}s", config.request_timeout.as_secs()),
        format!("pending_tx_max_age = {}s", config.pending_tx_max_age.as_secs()),
        format!("reaper_interval    = {}s", config.reaper_interval.as_secs()),
    ]
    .join("\n")
}

/// Print the resolved configuration
pub fn run_config(args: ConfigArgs) -> Result<()> {
    let config = ServiceConfig::from_env(ServiceKind::from(args.service))
        .context("Invalid service configuration in environment")?;

    println!("{}", render(&config));
    Ok(())
}
