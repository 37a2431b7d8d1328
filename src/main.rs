use anyhow::Result;
use clap::Parser;
use opnsense_exporter::{config::Config, server};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Protocol used to reach the OPNsense API (http or https)
    #[arg(long, env = "OPNSENSE_EXPORTER_OPS_PROTOCOL")]
    opnsense_protocol: Option<String>,

    /// OPNsense host, optionally with port (overrides config)
    #[arg(long, env = "OPNSENSE_EXPORTER_OPS_API")]
    opnsense_address: Option<String>,

    /// OPNsense API key (overrides config)
    #[arg(long, env = "OPNSENSE_EXPORTER_OPS_API_KEY", hide_env_values = true)]
    opnsense_api_key: Option<String>,

    /// OPNsense API secret (overrides config)
    #[arg(long, env = "OPNSENSE_EXPORTER_OPS_API_SECRET", hide_env_values = true)]
    opnsense_api_secret: Option<String>,

    /// File whose first line is the API key
    #[arg(long, env = "OPS_API_KEY_FILE")]
    opnsense_api_key_file: Option<PathBuf>,

    /// File whose first line is the API secret
    #[arg(long, env = "OPS_API_SECRET_FILE")]
    opnsense_api_secret_file: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long, env = "OPNSENSE_EXPORTER_OPS_INSECURE")]
    opnsense_insecure: bool,

    /// Value of the opnsense_instance label
    #[arg(long, env = "OPNSENSE_EXPORTER_INSTANCE_LABEL")]
    instance_label: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Path under which metrics are served
    #[arg(long, env = "EXPORTER_METRICS_PATH")]
    metrics_path: Option<String>,

    /// Leave out the process_* metrics about the exporter itself
    #[arg(
        long = "web.disable-exporter-metrics",
        env = "OPNSENSE_EXPORTER_DISABLE_EXPORTER_METRICS"
    )]
    disable_exporter_metrics: bool,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(protocol) = self.opnsense_protocol {
            config.opnsense.protocol = protocol;
        }
        if let Some(host) = self.opnsense_address {
            config.opnsense.host = host;
        }
        if let Some(api_key) = self.opnsense_api_key {
            config.opnsense.api_key = secrecy::SecretString::from(api_key);
        }
        if let Some(api_secret) = self.opnsense_api_secret {
            config.opnsense.api_secret = secrecy::SecretString::from(api_secret);
        }
        if self.opnsense_api_key_file.is_some() {
            config.opnsense.api_key_file = self.opnsense_api_key_file;
        }
        if self.opnsense_api_secret_file.is_some() {
            config.opnsense.api_secret_file = self.opnsense_api_secret_file;
        }
        if self.opnsense_insecure {
            config.opnsense.insecure = true;
        }
        if let Some(label) = self.instance_label {
            config.exporter.instance_label = label;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(path) = self.metrics_path {
            config.server.metrics_path = path;
        }
        if self.disable_exporter_metrics {
            config.exporter.disable_exporter_metrics = true;
        }
    }
}

fn load_config(args: Args) -> Result<Config> {
    let mut config = Config::load(&args.config)?;
    args.apply(&mut config);
    config.opnsense.resolve_credentials()?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting OPNsense Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let config = match load_config(args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully");
    info!("Instance label: {}", config.exporter.instance_label);

    if let Err(e) = server::start(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_alone_are_enough_to_start() {
        // Given: No config file, everything on the command line
        let args = Args::try_parse_from([
            "opnsense-exporter",
            "--config",
            "/nonexistent/opnsense-exporter",
            "--opnsense-address",
            "10.0.0.1",
            "--opnsense-api-key",
            "key",
            "--opnsense-api-secret",
            "secret",
            "--instance-label",
            "fw1",
            "--web.disable-exporter-metrics",
        ])
        .unwrap();

        // When: Loading the configuration
        let config = load_config(args).unwrap();

        // Then: Flags are applied on top of the defaults
        assert_eq!(config.opnsense.protocol, "https");
        assert_eq!(config.opnsense.host, "10.0.0.1");
        assert_eq!(config.exporter.instance_label, "fw1");
        assert!(config.exporter.disable_exporter_metrics);
        assert_eq!(config.server.metrics_path, "/metrics");
    }

    #[test]
    fn test_missing_host_fails_after_overrides() {
        let args = Args::try_parse_from([
            "opnsense-exporter",
            "--config",
            "/nonexistent/opnsense-exporter",
            "--opnsense-api-key",
            "key",
            "--opnsense-api-secret",
            "secret",
        ])
        .unwrap();

        let err = load_config(args).unwrap_err();
        assert!(err.to_string().contains("host"));
    }
}
