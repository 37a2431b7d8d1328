//! WireGuard Metrics Collector
//!
//! # Metrics Produced
//! - `opnsense_wireguard_interfaces_status` - 1 = up, 0 = down, 2 = unknown
//!   - Labels: device, device_type, device_name
//! - `opnsense_wireguard_peer_received_bytes_total`
//! - `opnsense_wireguard_peer_transmitted_bytes_total`
//! - `opnsense_wireguard_peer_last_handshake_seconds`
//!   - Labels: device, device_type, device_name, peer_name

use super::{Emitter, MetricDesc, SourceAdapter, WIREGUARD};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct WireguardCollector {
    instance: String,
    interfaces_status: MetricDesc,
    peer_received_bytes: MetricDesc,
    peer_transmitted_bytes: MetricDesc,
    peer_last_handshake: MetricDesc,
}

impl WireguardCollector {
    pub fn new() -> Self {
        const PEER_LABELS: &[&str] = &["device", "device_type", "device_name", "peer_name"];
        Self {
            instance: String::new(),
            interfaces_status: MetricDesc::gauge(
                WIREGUARD,
                "interfaces_status",
                "Wireguard interface (1 = up, 0 = down, 2 = unknown)",
                &["device", "device_type", "device_name"],
            ),
            peer_received_bytes: MetricDesc::counter(
                WIREGUARD,
                "peer_received_bytes_total",
                "Bytes received by this wireguard peer",
                PEER_LABELS,
            ),
            peer_transmitted_bytes: MetricDesc::counter(
                WIREGUARD,
                "peer_transmitted_bytes_total",
                "Bytes transmitted by this wireguard peer",
                PEER_LABELS,
            ),
            peer_last_handshake: MetricDesc::gauge(
                WIREGUARD,
                "peer_last_handshake_seconds",
                "Last handshake by peer in seconds",
                PEER_LABELS,
            ),
        }
    }
}

impl Default for WireguardCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for WireguardCollector {
    fn name(&self) -> &'static str {
        WIREGUARD
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![
            &self.interfaces_status,
            &self.peer_received_bytes,
            &self.peer_transmitted_bytes,
            &self.peer_last_handshake,
        ]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let data = client.fetch_wireguard_clients().await?;

        for interface in &data.interfaces {
            out.emit(
                &self.interfaces_status,
                interface.status.as_value(),
                &[
                    &interface.device,
                    &interface.device_type,
                    &interface.device_name,
                    &self.instance,
                ],
            );
        }

        for peer in &data.peers {
            let labels: [&str; 5] = [
                &peer.device,
                &peer.device_type,
                &peer.device_name,
                &peer.name,
                &self.instance,
            ];
            out.emit(&self.peer_received_bytes, peer.transfer_rx, &labels);
            out.emit(&self.peer_transmitted_bytes, peer.transfer_tx, &labels);
            out.emit(&self.peer_last_handshake, peer.latest_handshake, &labels);
        }
        Ok(())
    }
}
