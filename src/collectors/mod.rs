//! Metrics Collectors
//!
//! This module contains one collector per OPNsense feature area (ARP table, cron,
//! gateways, VPNs, ...). Each collector queries the endpoints it needs through the
//! shared [`OpnSenseClient`] and turns the records into samples.
//!
//! # Architecture
//!
//! Collectors implement [`SourceAdapter`]:
//! - `name()` - stable subsystem name, also used to disable the collector
//! - `register()` - called once before the first scrape with the instance label
//! - `describe()` - the metric descriptors the collector can emit
//! - `update()` - fetch and emit into a per-task [`Emitter`]
//!
//! # Error Handling
//!
//! `update()` returns the first [`FetchError`] it hits. Samples emitted before the
//! failure are kept; the scrape loop counts and logs the error and carries on with
//! the other collectors. How a collector treats failures of secondary calls is
//! decided per collector and documented in its module.

use crate::error::{ExporterError, Result};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix of every collector metric
pub const NAMESPACE: &str = "opnsense";

/// Label carrying the configured instance identifier, always the last label
pub const INSTANCE_LABEL: &str = "opnsense_instance";

pub const ARP_TABLE: &str = "arp_table";
pub const CRON: &str = "cron";
pub const SERVICES: &str = "services";
pub const FIREWALL: &str = "firewall";
pub const INTERFACES: &str = "interfaces";
pub const PROTOCOL: &str = "protocol";
pub const GATEWAYS: &str = "gateways";
pub const FIRMWARE: &str = "firmware";
pub const OPENVPN: &str = "openvpn";
pub const WIREGUARD: &str = "wireguard";
pub const IPSEC: &str = "ipsec";
pub const UNBOUND_DNS: &str = "unbound_dns";
pub const DHCP: &str = "dhcp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Self-description of one metric family a collector emits
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDesc {
    pub fq_name: String,
    pub help: String,
    /// Label names, ending with [`INSTANCE_LABEL`]
    pub labels: Vec<String>,
    pub kind: MetricKind,
}

impl MetricDesc {
    pub fn gauge(subsystem: &str, name: &str, help: &str, labels: &[&str]) -> Self {
        Self::build(subsystem, name, help, labels, MetricKind::Gauge)
    }

    pub fn counter(subsystem: &str, name: &str, help: &str, labels: &[&str]) -> Self {
        Self::build(subsystem, name, help, labels, MetricKind::Counter)
    }

    fn build(subsystem: &str, name: &str, help: &str, labels: &[&str], kind: MetricKind) -> Self {
        let labels = labels
            .iter()
            .copied()
            .chain(std::iter::once(INSTANCE_LABEL))
            .map(str::to_string)
            .collect();
        Self {
            fq_name: format!("{}_{}_{}", NAMESPACE, subsystem, name),
            help: help.to_string(),
            labels,
            kind,
        }
    }
}

/// One emitted measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub fq_name: String,
    pub label_values: Vec<String>,
    pub value: f64,
}

/// Per-task sample buffer.
///
/// Every collector task owns its own emitter; the scrape loop merges them after
/// the join, so emission never contends on a lock.
#[derive(Debug, Default)]
pub struct Emitter {
    samples: Vec<Sample>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `desc`. `label_values` must line up with `desc.labels`,
    /// instance label included; mismatched samples are logged and dropped.
    pub fn emit(&mut self, desc: &MetricDesc, value: f64, label_values: &[&str]) {
        if label_values.len() != desc.labels.len() {
            warn!(
                metric = %desc.fq_name,
                expected = desc.labels.len(),
                got = label_values.len(),
                "dropping sample with wrong label count"
            );
            return;
        }
        self.samples.push(Sample {
            fq_name: desc.fq_name.clone(),
            label_values: label_values.iter().map(|v| v.to_string()).collect(),
            value,
        });
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A feature-area collector
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable subsystem name
    fn name(&self) -> &'static str;

    /// Store the instance label; called once before the collector is shared
    fn register(&mut self, instance: &str);

    fn describe(&self) -> Vec<&MetricDesc>;

    /// Fetch this feature area and emit its samples into `out`
    async fn update(
        &self,
        client: &OpnSenseClient,
        out: &mut Emitter,
    ) -> std::result::Result<(), FetchError>;
}

/// Every known collector, in registry order
pub fn all_adapters() -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(arp_table::ArpTableCollector::new()),
        Box::new(cron::CronCollector::new()),
        Box::new(services::ServicesCollector::new()),
        Box::new(firewall::FirewallCollector::new()),
        Box::new(interfaces::InterfacesCollector::new()),
        Box::new(protocol::ProtocolCollector::new()),
        Box::new(gateways::GatewaysCollector::new()),
        Box::new(firmware::FirmwareCollector::new()),
        Box::new(openvpn::OpenVpnCollector::new()),
        Box::new(wireguard::WireguardCollector::new()),
        Box::new(ipsec::IpsecCollector::new()),
        Box::new(unbound_dns::UnboundDnsCollector::new()),
        Box::new(dhcp::DhcpCollector::new()),
    ]
}

/// Ordered set of collectors, pruned by configuration before the first scrape
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Registry holding every known collector
    pub fn with_all() -> Self {
        Self::new(all_adapters())
    }

    /// Remove the collector named `name`
    ///
    /// # Errors
    ///
    /// Returns `ExporterError::UnknownCollector` if no collector has that name.
    pub fn without(&mut self, name: &str) -> Result<()> {
        let position = self
            .adapters
            .iter()
            .position(|adapter| adapter.name() == name)
            .ok_or_else(|| ExporterError::UnknownCollector(name.to_string()))?;
        self.adapters.remove(position);
        Ok(())
    }

    /// Remove every collector in `names`, failing on the first unknown one
    pub fn without_all<'a, I>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            self.without(name)?;
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|adapter| adapter.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Register every collector with `instance` and freeze the set
    pub fn register_all(self, instance: &str) -> Arc<[Arc<dyn SourceAdapter>]> {
        self.adapters
            .into_iter()
            .map(|mut adapter| {
                adapter.register(instance);
                debug!(collector = adapter.name(), "registered collector");
                Arc::from(adapter)
            })
            .collect()
    }
}

pub mod arp_table;
pub mod cron;
pub mod dhcp;
pub mod firewall;
pub mod firmware;
pub mod gateways;
pub mod interfaces;
pub mod ipsec;
pub mod openvpn;
pub mod protocol;
pub mod services;
pub mod unbound_dns;
pub mod wireguard;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desc_appends_instance_label() {
        let desc = MetricDesc::gauge(ARP_TABLE, "entries", "Arp entries", &["ip", "mac"]);
        assert_eq!(desc.fq_name, "opnsense_arp_table_entries");
        assert_eq!(desc.labels, vec!["ip", "mac", INSTANCE_LABEL]);
        assert_eq!(desc.kind, MetricKind::Gauge);

        let desc = MetricDesc::counter(SERVICES, "running_total", "Running", &[]);
        assert_eq!(desc.labels, vec![INSTANCE_LABEL]);
    }

    #[test]
    fn test_emitter_drops_mismatched_labels() {
        let desc = MetricDesc::gauge(CRON, "job_status", "Cron job status", &["schedule"]);
        let mut out = Emitter::new();

        out.emit(&desc, 1.0, &["* * * * *", "fw1"]);
        out.emit(&desc, 1.0, &["* * * * *"]);

        assert_eq!(out.len(), 1);
        assert_eq!(out.samples()[0].label_values, vec!["* * * * *", "fw1"]);
    }

    #[test]
    fn test_registry_names_are_unique() {
        let registry = AdapterRegistry::with_all();
        let mut names = registry.names();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 13);
    }

    #[test]
    fn test_without_unknown_name_fails() {
        let mut registry = AdapterRegistry::with_all();
        let err = registry.without("bogus").unwrap_err();
        assert!(matches!(err, ExporterError::UnknownCollector(name) if name == "bogus"));
        assert_eq!(registry.len(), 13);
    }

    #[test]
    fn test_without_removes_once() {
        let mut registry = AdapterRegistry::with_all();
        registry.without(DHCP).unwrap();
        assert!(!registry.names().contains(&DHCP));
        assert!(registry.without(DHCP).is_err());
    }

    #[test]
    fn test_every_descriptor_ends_with_instance_label() {
        for adapter in all_adapters() {
            for desc in adapter.describe() {
                assert!(
                    desc.fq_name.starts_with(&format!("{}_{}_", NAMESPACE, adapter.name())),
                    "{} not under {}",
                    desc.fq_name,
                    adapter.name()
                );
                assert_eq!(desc.labels.last().map(String::as_str), Some(INSTANCE_LABEL));
            }
        }
    }
}
