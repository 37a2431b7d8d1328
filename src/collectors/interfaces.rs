//! Network Interface Metrics Collector
//!
//! # Metrics Produced
//! Per interface, labelled `interface`, `device`, `type`:
//! - `opnsense_interfaces_mtu_bytes`
//! - `opnsense_interfaces_received_bytes_total` / `transmitted_bytes_total`
//! - `opnsense_interfaces_received_multicasts_total` / `transmitted_multicasts_total`
//! - `opnsense_interfaces_input_errors_total` / `output_errors_total`
//! - `opnsense_interfaces_collisions_total`
//!
//! A counter that does not parse fails the whole collector for this scrape.

use super::{Emitter, MetricDesc, SourceAdapter, INTERFACES};
use crate::opnsense::types::Interface;
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

type Extractor = fn(&Interface) -> i64;

pub struct InterfacesCollector {
    instance: String,
    mtu: MetricDesc,
    counters: Vec<(MetricDesc, Extractor)>,
}

impl InterfacesCollector {
    pub fn new() -> Self {
        const LABELS: &[&str] = &["interface", "device", "type"];
        let counter = |name: &str, help: &str, extract: Extractor| {
            (MetricDesc::counter(INTERFACES, name, help, LABELS), extract)
        };

        Self {
            instance: String::new(),
            mtu: MetricDesc::gauge(
                INTERFACES,
                "mtu_bytes",
                "The MTU value of the interface",
                LABELS,
            ),
            counters: vec![
                counter(
                    "received_bytes_total",
                    "Bytes received on this interface by interface name and device",
                    |i| i.bytes_received,
                ),
                counter(
                    "transmitted_bytes_total",
                    "Bytes transmitted on this interface by interface name and device",
                    |i| i.bytes_transmitted,
                ),
                counter(
                    "received_multicasts_total",
                    "Multicasts received on this interface by interface name and device",
                    |i| i.multicasts_received,
                ),
                counter(
                    "transmitted_multicasts_total",
                    "Multicasts transmitted on this interface by interface name and device",
                    |i| i.multicasts_transmitted,
                ),
                counter(
                    "input_errors_total",
                    "Input errors on this interface by interface name and device",
                    |i| i.input_errors,
                ),
                counter(
                    "output_errors_total",
                    "Output errors on this interface by interface name and device",
                    |i| i.output_errors,
                ),
                counter(
                    "collisions_total",
                    "Collisions on this interface by interface name and device",
                    |i| i.collisions,
                ),
            ],
        }
    }
}

impl Default for InterfacesCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for InterfacesCollector {
    fn name(&self) -> &'static str {
        INTERFACES
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        std::iter::once(&self.mtu)
            .chain(self.counters.iter().map(|(desc, _)| desc))
            .collect()
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let data = client.fetch_interfaces().await?;

        for interface in &data.interfaces {
            let labels: [&str; 4] = [
                interface.name.as_str(),
                &interface.device,
                &interface.interface_type,
                &self.instance,
            ];
            out.emit(&self.mtu, interface.mtu as f64, &labels);
            for (desc, extract) in &self.counters {
                out.emit(desc, extract(interface) as f64, &labels);
            }
        }
        Ok(())
    }
}
