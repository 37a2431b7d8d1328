//! IPsec Metrics Collector
//!
//! # Metrics Produced
//! Phase 1, labelled `description`, `name`:
//! - `opnsense_ipsec_phase1_status` (1 = connected, 0 = down)
//! - `opnsense_ipsec_phase1_install_time`, `phase1_bytes_in`, `phase1_bytes_out`,
//!   `phase1_packets_in`, `phase1_packets_out`
//!
//! Phase 2, labelled `description`, `name`, `spi_in`, `spi_out`, `phase1_name`:
//! - `opnsense_ipsec_phase2_install_time`, `phase2_bytes_in`, `phase2_bytes_out`,
//!   `phase2_packets_in`, `phase2_packets_out`, `phase2_rekey_time`, `phase2_life_time`
//!
//! # Partial failures
//!
//! Phase 2 is fetched per tunnel after phase 1. When that call fails for a tunnel,
//! the failure is logged, the tunnel's phase 2 samples are skipped and the
//! remaining tunnels are still processed. The first phase 2 error is returned once
//! everything else has been emitted so the scrape loop still counts it.

use super::{Emitter, MetricDesc, SourceAdapter, IPSEC};
use crate::opnsense::types::{IpsecPhase1, IpsecPhase2};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;
use tracing::warn;

type Phase1Extractor = fn(&IpsecPhase1) -> i64;
type Phase2Extractor = fn(&IpsecPhase2) -> i64;

pub struct IpsecCollector {
    instance: String,
    phase1: Vec<(MetricDesc, Phase1Extractor)>,
    phase2: Vec<(MetricDesc, Phase2Extractor)>,
}

impl IpsecCollector {
    pub fn new() -> Self {
        const PHASE1_LABELS: &[&str] = &["description", "name"];
        const PHASE2_LABELS: &[&str] = &["description", "name", "spi_in", "spi_out", "phase1_name"];

        let phase1 = |name: &str, help: &str, extract: Phase1Extractor| {
            (MetricDesc::gauge(IPSEC, name, help, PHASE1_LABELS), extract)
        };
        let phase2 = |name: &str, help: &str, extract: Phase2Extractor| {
            (MetricDesc::gauge(IPSEC, name, help, PHASE2_LABELS), extract)
        };

        Self {
            instance: String::new(),
            phase1: vec![
                phase1(
                    "phase1_status",
                    "IPsec phase1 (1 = connected, 0 = down)",
                    |p| i64::from(p.connected),
                ),
                phase1("phase1_install_time", "IPsec phase1 install time", |p| p.install_time),
                phase1("phase1_bytes_in", "IPsec phase1 bytes in", |p| p.bytes_in),
                phase1("phase1_bytes_out", "IPsec phase1 bytes out", |p| p.bytes_out),
                phase1("phase1_packets_in", "IPsec phase1 packets in", |p| p.packets_in),
                phase1("phase1_packets_out", "IPsec phase1 packets out", |p| p.packets_out),
            ],
            phase2: vec![
                phase2("phase2_install_time", "IPsec phase2 install time", |p| p.install_time),
                phase2("phase2_bytes_in", "IPsec phase2 bytes in", |p| p.bytes_in),
                phase2("phase2_bytes_out", "IPsec phase2 bytes out", |p| p.bytes_out),
                phase2("phase2_packets_in", "IPsec phase2 packets in", |p| p.packets_in),
                phase2("phase2_packets_out", "IPsec phase2 packets out", |p| p.packets_out),
                phase2("phase2_rekey_time", "IPsec phase2 rekey time", |p| p.rekey_time),
                phase2("phase2_life_time", "IPsec phase2 life time", |p| p.life_time),
            ],
        }
    }
}

impl Default for IpsecCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for IpsecCollector {
    fn name(&self) -> &'static str {
        IPSEC
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        self.phase1
            .iter()
            .map(|(desc, _)| desc)
            .chain(self.phase2.iter().map(|(desc, _)| desc))
            .collect()
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let tunnels = client.fetch_ipsec_phase1().await?;
        let mut first_phase2_error = None;

        for tunnel in &tunnels.tunnels {
            let labels: [&str; 3] = [&tunnel.description, &tunnel.name, &self.instance];
            for (desc, extract) in &self.phase1 {
                out.emit(desc, extract(tunnel) as f64, &labels);
            }

            let children = match client.fetch_ipsec_phase2(&tunnel.name).await {
                Ok(children) => children,
                Err(e) => {
                    warn!(tunnel = %tunnel.name, error = %e, "failed to fetch ipsec phase2, skipping tunnel");
                    first_phase2_error.get_or_insert(e);
                    continue;
                }
            };

            for child in &children {
                let labels: [&str; 6] = [
                    &child.description,
                    &child.name,
                    &child.spi_in,
                    &child.spi_out,
                    &tunnel.name,
                    &self.instance,
                ];
                for (desc, extract) in &self.phase2 {
                    out.emit(desc, extract(child) as f64, &labels);
                }
            }
        }

        match first_phase2_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
