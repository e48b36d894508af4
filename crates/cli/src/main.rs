use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dssmcp_api::DssConnector;
use dssmcp_mcp::config::{config_path_from_env, load_config_from_path, validate_config};
use dssmcp_mcp::{ConfigOverrides, McpHttpServer, ServerConfig, Transport, serve_stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportArg {
    Http,
    Stdio,
}

impl From<TransportArg> for Transport {
    fn from(value: TransportArg) -> Self {
        match value {
            TransportArg::Http => Transport::Http,
            TransportArg::Stdio => Transport::Stdio,
        }
    }
}

/// Serve a Dataiku DSS instance to MCP clients.
#[derive(Debug, Parser)]
#[command(name = "dssmcp", version, about)]
struct Cli {
    /// JSON configuration file; flags and environment variables override its values.
    #[arg(long, env = "DSSMCP_CONFIG")]
    config: Option<PathBuf>,
    /// Base URL of the platform.
    #[arg(long, env = "DSS_URL")]
    dss_url: Option<String>,
    #[arg(long, value_enum)]
    transport: Option<TransportArg>,
    /// Socket address for the HTTP transport.
    #[arg(long)]
    bind: Option<String>,
    /// Allow the HTTP transport to listen on a non-loopback address.
    #[arg(long)]
    allow_non_loopback: bool,
    /// API key for the stdio transport.
    #[arg(long, env = "DSS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Accept self-signed or otherwise invalid platform certificates.
    #[arg(long, env = "DSS_INSECURE_SKIP_TLS_VERIFY")]
    insecure_skip_tls_verify: bool,
    #[arg(long)]
    request_timeout_secs: Option<u64>,
    #[arg(long)]
    job_poll_interval_millis: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            dss_url: self.dss_url.clone(),
            transport: self.transport.map(Transport::from),
            bind_address: self.bind.clone(),
            allow_non_loopback: self.allow_non_loopback,
            api_key: self.api_key.clone(),
            insecure_skip_tls_verify: self.insecure_skip_tls_verify,
            request_timeout_secs: self.request_timeout_secs,
            job_poll_interval_millis: self.job_poll_interval_millis,
        }
    }

    fn load_config(&self) -> Result<ServerConfig> {
        let mut config = match self.config.clone().or_else(config_path_from_env) {
            Some(path) => load_config_from_path(&path)?,
            None => ServerConfig::default(),
        };
        config.apply_overrides(self.overrides());
        validate_config(&config).context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.load_config()?;
    let connector = DssConnector::new(&config.dss_url, &config.client_options(), config.credential_strategy())
        .context("cannot configure the platform client")?;
    let connector = Arc::new(connector);
    info!(
        platform = %connector.base_url(),
        credentials = connector.strategy_name(),
        transport = ?config.transport,
        "starting dssmcp"
    );

    match config.transport {
        Transport::Http => {
            let server = McpHttpServer::new(config.http_bind_address()?, connector).start().await?;
            tokio::signal::ctrl_c().await.context("cannot listen for shutdown signal")?;
            info!("shutdown requested");
            server.stop().await
        }
        Transport::Stdio => serve_stdio(connector).await,
    }
}

/// Logs go to stderr so the stdio transport keeps stdout for protocol messages.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dssmcp").chain(args.iter().copied())).expect("arguments")
    }

    #[test]
    fn flags_override_defaults() {
        temp_env::with_vars_unset(["DSSMCP_CONFIG", "DSS_URL", "DSS_API_KEY", "DSS_INSECURE_SKIP_TLS_VERIFY"], || {
            let cli = parse(&["--dss-url", "https://dss.example.com", "--transport", "stdio", "--api-key", "secret"]);
            let config = cli.load_config().expect("config");
            assert_eq!(config.transport, Transport::Stdio);
            assert_eq!(config.api_key.as_deref(), Some("secret"));
            assert_eq!(config.bind_address, "127.0.0.1:8000");
        });
    }

    #[test]
    fn environment_supplies_platform_url() {
        temp_env::with_vars(
            [
                ("DSS_URL", Some("https://env.example.com")),
                ("DSSMCP_CONFIG", None),
                ("DSS_API_KEY", None),
                ("DSS_INSECURE_SKIP_TLS_VERIFY", None),
            ],
            || {
                let config = parse(&[]).load_config().expect("config");
                assert_eq!(config.dss_url, "https://env.example.com");
                assert_eq!(config.transport, Transport::Http);
            },
        );
    }

    #[test]
    fn rejects_public_bind_without_opt_in() {
        temp_env::with_vars_unset(["DSSMCP_CONFIG", "DSS_URL", "DSS_API_KEY", "DSS_INSECURE_SKIP_TLS_VERIFY"], || {
            let cli = parse(&["--dss-url", "https://dss.example.com", "--bind", "0.0.0.0:8000"]);
            assert!(cli.load_config().is_err());
            let cli = parse(&["--dss-url", "https://dss.example.com", "--bind", "0.0.0.0:8000", "--allow-non-loopback"]);
            assert!(cli.load_config().is_ok());
        });
    }
}
