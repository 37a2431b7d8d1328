//! OpenVPN Instances Metrics Collector
//!
//! # Metrics Produced
//! - `opnsense_openvpn_instances` - Instance state (1 = enabled, 0 = disabled)
//!   - Labels: uuid, role, description, device_type
//!
//! An `enabled` flag that does not parse fails the collector for this scrape.

use super::{Emitter, MetricDesc, SourceAdapter, OPENVPN};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct OpenVpnCollector {
    instance: String,
    instances: MetricDesc,
}

impl OpenVpnCollector {
    pub fn new() -> Self {
        Self {
            instance: String::new(),
            instances: MetricDesc::gauge(
                OPENVPN,
                "instances",
                "OpenVPN instances (1 = enabled, 0 = disabled) by role (server, client)",
                &["uuid", "role", "description", "device_type"],
            ),
        }
    }
}

impl Default for OpenVpnCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for OpenVpnCollector {
    fn name(&self) -> &'static str {
        OPENVPN
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![&self.instances]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let data = client.fetch_openvpn_instances().await?;

        for vpn in &data.instances {
            out.emit(
                &self.instances,
                vpn.enabled as f64,
                &[
                    &vpn.uuid,
                    &vpn.role,
                    &vpn.description,
                    &vpn.device_type,
                    &self.instance,
                ],
            );
        }
        Ok(())
    }
}
