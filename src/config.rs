use crate::collectors;
use crate::error::{ExporterError, Result};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub opnsense: OpnSenseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub exporter: ExporterConfig,
    #[serde(default)]
    pub collectors: CollectorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpnSenseConfig {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "empty_secret")]
    pub api_key: SecretString,
    #[serde(default = "empty_secret")]
    pub api_secret: SecretString,
    /// File whose first line holds the API key; wins over `api_key` when non-empty
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,
    /// File whose first line holds the API secret; wins over `api_secret` when non-empty
    #[serde(default)]
    pub api_secret_file: Option<PathBuf>,
    /// Disable TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExporterConfig {
    /// Value of the `opnsense_instance` label attached to every metric
    #[serde(default = "default_instance_label")]
    pub instance_label: String,
    /// Ask the firewall to refresh its firmware status once at startup
    #[serde(default)]
    pub firmware_check_on_start: bool,
    /// Leave out the `process_*` metrics about the exporter itself
    #[serde(default)]
    pub disable_exporter_metrics: bool,
}

/// Per-feature switches. Services, interfaces, protocol and gateways are always collected.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectorsConfig {
    #[serde(default = "default_true")]
    pub arp_table: bool,
    #[serde(default = "default_true")]
    pub cron: bool,
    #[serde(default = "default_true")]
    pub wireguard: bool,
    #[serde(default = "default_true")]
    pub ipsec: bool,
    #[serde(default = "default_true")]
    pub unbound_dns: bool,
    #[serde(default = "default_true")]
    pub openvpn: bool,
    #[serde(default = "default_true")]
    pub firewall: bool,
    #[serde(default = "default_true")]
    pub firmware: bool,
    #[serde(default = "default_true")]
    pub dhcp: bool,
}

fn default_protocol() -> String {
    "https".to_string()
}

fn empty_secret() -> SecretString {
    SecretString::from("")
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_instance_label() -> String {
    "opnsense".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OpnSenseConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            host: String::new(),
            api_key: empty_secret(),
            api_secret: empty_secret(),
            api_key_file: None,
            api_secret_file: None,
            insecure: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
            metrics_path: default_metrics_path(),
        }
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            instance_label: default_instance_label(),
            firmware_check_on_start: false,
            disable_exporter_metrics: false,
        }
    }
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            arp_table: true,
            cron: true,
            wireguard: true,
            ipsec: true,
            unbound_dns: true,
            openvpn: true,
            firewall: true,
            firmware: true,
            dhcp: true,
        }
    }
}

impl CollectorsConfig {
    /// Names of the collectors switched off, in registry order
    pub fn disabled(&self) -> Vec<&'static str> {
        [
            (collectors::ARP_TABLE, self.arp_table),
            (collectors::CRON, self.cron),
            (collectors::WIREGUARD, self.wireguard),
            (collectors::IPSEC, self.ipsec),
            (collectors::UNBOUND_DNS, self.unbound_dns),
            (collectors::OPENVPN, self.openvpn),
            (collectors::FIREWALL, self.firewall),
            (collectors::FIRMWARE, self.firmware),
            (collectors::DHCP, self.dhcp),
        ]
        .into_iter()
        .filter(|(_, enabled)| !enabled)
        .map(|(name, _)| name)
        .collect()
    }
}

impl OpnSenseConfig {
    /// `<protocol>://<host>`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.host)
    }

    /// Replace inline credentials with the first line of their files, when set
    pub fn resolve_credentials(&mut self) -> Result<()> {
        if let Some(path) = &self.api_key_file {
            let key = read_first_line(path)?;
            if !key.is_empty() {
                self.api_key = SecretString::from(key);
            }
        }
        if let Some(path) = &self.api_secret_file {
            let secret = read_first_line(path)?;
            if !secret.is_empty() {
                self.api_secret = SecretString::from(secret);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ExporterError::Config(
                "protocol must be one of: [http, https]".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(ExporterError::Config("host must be set".to_string()));
        }
        if self.api_key.expose_secret().is_empty() {
            return Err(ExporterError::Config(
                "api_key or api_key_file must be set".to_string(),
            ));
        }
        if self.api_secret.expose_secret().is_empty() {
            return Err(ExporterError::Config(
                "api_secret or api_secret_file must be set".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_first_line(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ExporterError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    Ok(content.lines().next().unwrap_or_default().trim().to_string())
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("OPNSENSE_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Startup checks; any failure here stops the process before the first scrape
    pub fn validate(&self) -> Result<()> {
        self.opnsense.validate()?;

        if self.exporter.instance_label.trim().is_empty() {
            return Err(ExporterError::Config(
                "instance_label must be set".to_string(),
            ));
        }
        if !self.server.metrics_path.starts_with('/') {
            return Err(ExporterError::Config(format!(
                "metrics_path must start with '/': {}",
                self.server.metrics_path
            )));
        }
        Ok(())
    }
}
