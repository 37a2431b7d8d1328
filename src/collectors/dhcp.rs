//! DHCPv4 Lease Metrics Collector
//!
//! # Metrics Produced
//! - `opnsense_dhcp_leases` - Number of leases
//!   - Labels: interface, type, state

use super::{Emitter, MetricDesc, SourceAdapter, DHCP};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct DhcpCollector {
    instance: String,
    leases: MetricDesc,
}

impl DhcpCollector {
    pub fn new() -> Self {
        Self {
            instance: String::new(),
            leases: MetricDesc::gauge(
                DHCP,
                "leases",
                "Number of DHCPv4 leases by interface, type and state",
                &["interface", "type", "state"],
            ),
        }
    }
}

impl Default for DhcpCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for DhcpCollector {
    fn name(&self) -> &'static str {
        DHCP
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![&self.leases]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let leases = client.fetch_dhcp_leases().await?;

        for ((interface, lease_type, state), count) in &leases.counts {
            out.emit(
                &self.leases,
                *count as f64,
                &[interface, lease_type, state, &self.instance],
            );
        }
        Ok(())
    }
}
