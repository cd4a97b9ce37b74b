//! Group Role Management Policy Lookup CLI
//!
//! Resolves the role management policy assigned to a group for one role
//! relationship and prints its id.
//!
//! # Usage
//!
//! ```bash
//! # Look up the owner policy of a group
//! ROLEPOLICY_ACCESS_TOKEN=... policy-lookup \
//!     --group-id 11111111-1111-1111-1111-111111111111 --role-id owner
//!
//! # Print the resolved resource as JSON
//! policy-lookup --group-id ... --role-id member --json
//!
//! # Enable debug logging
//! RUST_LOG=debug policy-lookup --group-id ... --role-id owner
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Filter directives, overriding `--log-level`
//! - `ROLEPOLICY_LOG_LEVEL`: Logging level when `RUST_LOG` is unset (default: warn)
//! - `ROLEPOLICY_GROUP_ID` / `ROLEPOLICY_ROLE_ID`: Lookup input
//! - `ROLEPOLICY_READ_TIMEOUT_SECS`: Read timeout in seconds, at least 1 (default: 300)
//! - `ROLEPOLICY_ENDPOINT`: Directory endpoint (default: https://graph.microsoft.com)
//! - `ROLEPOLICY_API_VERSION`: API version segment (default: beta)
//! - `ROLEPOLICY_ACCESS_TOKEN`: Bearer token for the directory
//! - `ROLEPOLICY_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds (default: 30)
//! - `ROLEPOLICY_MAX_ATTEMPTS`: Attempts per request when retries are enabled (default: 4)

use anyhow::{Context, Result};
use clap::Parser;
use rolepolicy_core::RequestContext;
use rolepolicy_directory::{DirectoryConfig, GraphClient};
use rolepolicy_lookup::{GroupRoleManagementPolicyDataSource, ResourceData};
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Group Role Management Policy Lookup
#[derive(Parser, Debug)]
#[command(
    name = "policy-lookup",
    version,
    about = "Resolve the role management policy assigned to a group",
    long_about = None
)]
struct Args {
    /// ID of the group to which the policy is assigned
    #[arg(short = 'g', long, env = "ROLEPOLICY_GROUP_ID")]
    group_id: String,

    /// Role of the policy to the group (member, owner, unknown)
    #[arg(short = 'r', long, env = "ROLEPOLICY_ROLE_ID")]
    role_id: String,

    /// Directory endpoint
    #[arg(long, env = "ROLEPOLICY_ENDPOINT")]
    endpoint: Option<String>,

    /// API version segment
    #[arg(long, env = "ROLEPOLICY_API_VERSION")]
    api_version: Option<String>,

    /// Read timeout in seconds
    #[arg(
        short = 't',
        long,
        default_value = "300",
        env = "ROLEPOLICY_READ_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,

    /// Print the resolved resource as JSON
    #[arg(long, env = "ROLEPOLICY_JSON")]
    json: bool,

    /// Print lookup metrics in Prometheus text format to stderr
    #[arg(long, env = "ROLEPOLICY_METRICS")]
    metrics: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long, default_value = "warn", env = "ROLEPOLICY_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let mut config = DirectoryConfig::from_env().context("invalid directory configuration")?;
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(api_version) = &args.api_version {
        config.api_version = api_version.clone();
    }
    debug!(?config, "Loaded directory configuration");

    let client = GraphClient::new(config).context("failed to build directory client")?;
    let data_source = GroupRoleManagementPolicyDataSource::new()
        .context("failed to register lookup metrics")?
        .with_read_timeout(Duration::from_secs(args.timeout_secs));

    let ctx = RequestContext::background();
    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling lookup");
            token.cancel();
        }
    });

    let mut data = ResourceData::new()
        .with("group_id", args.group_id.as_str())
        .with("role_id", args.role_id.as_str());
    let diagnostics = data_source.invoke(&ctx, &mut data, &client).await;

    if args.metrics {
        eprint!("{}", data_source.metrics().export()?);
    }
    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
    }
    if diagnostics.has_error() {
        error!(diagnostics = diagnostics.len(), "Lookup failed");
        std::process::exit(1);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else if let Some(id) = data.id() {
        println!("{id}");
    }
    Ok(())
}

/// Initialize tracing/logging subsystem
fn init_tracing(args: &Args) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), &args.log_level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}

/// Filter directives: `RUST_LOG` verbatim when set, otherwise `--log-level`
/// applied to this workspace's crates
fn log_filter(rust_log: Option<&str>, log_level: &str) -> String {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return directives.to_string();
    }

    let level = log_level.parse::<tracing::Level>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{log_level}', using 'warn'");
        tracing::Level::WARN
    });
    format!(
        "policy_lookup={level},rolepolicy_lookup={level},rolepolicy_directory={level},rolepolicy_core={level}"
    )
}
