//! ARP Table Metrics Collector
//!
//! # Metrics Produced
//! - `opnsense_arp_table_entries` - One series per ARP entry, value always 1
//!   - Labels: ip, mac, hostname, interface_description, type, expired, permanent

use super::{Emitter, MetricDesc, SourceAdapter, ARP_TABLE};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct ArpTableCollector {
    instance: String,
    entries: MetricDesc,
}

impl ArpTableCollector {
    pub fn new() -> Self {
        Self {
            instance: String::new(),
            entries: MetricDesc::gauge(
                ARP_TABLE,
                "entries",
                "Arp entries by ip, mac, hostname, interface description, type, expired and permanent",
                &[
                    "ip",
                    "mac",
                    "hostname",
                    "interface_description",
                    "type",
                    "expired",
                    "permanent",
                ],
            ),
        }
    }
}

impl Default for ArpTableCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for ArpTableCollector {
    fn name(&self) -> &'static str {
        ARP_TABLE
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![&self.entries]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let table = client.fetch_arp_table().await?;

        for entry in &table.entries {
            let expired = entry.expired.to_string();
            let permanent = entry.permanent.to_string();
            out.emit(
                &self.entries,
                1.0,
                &[
                    &entry.ip,
                    &entry.mac,
                    &entry.hostname,
                    &entry.interface_description,
                    &entry.entry_type,
                    &expired,
                    &permanent,
                    &self.instance,
                ],
            );
        }
        Ok(())
    }
}
