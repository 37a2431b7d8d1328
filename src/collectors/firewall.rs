//! Firewall (pf) Metrics Collector
//!
//! # Metrics Produced
//! Per interface, labelled `interface`:
//! - `opnsense_firewall_{in,out}_ipv4_{pass,block}_packets`
//! - `opnsense_firewall_{in,out}_ipv6_{pass,block}_packets`

use super::{Emitter, MetricDesc, SourceAdapter, FIREWALL};
use crate::opnsense::types::PfInterfaceStats;
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

type Extractor = fn(&PfInterfaceStats) -> i64;

const PACKET_COUNTERS: [(&str, &str, Extractor); 8] = [
    ("in_ipv4_pass_packets", "The number of IPv4 incoming packets that were passed", |s| s.in4_pass_packets),
    ("out_ipv4_pass_packets", "The number of IPv4 outgoing packets that were passed", |s| s.out4_pass_packets),
    ("in_ipv4_block_packets", "The number of IPv4 incoming packets that were blocked", |s| s.in4_block_packets),
    ("out_ipv4_block_packets", "The number of IPv4 outgoing packets that were blocked", |s| s.out4_block_packets),
    ("in_ipv6_pass_packets", "The number of IPv6 incoming packets that were passed", |s| s.in6_pass_packets),
    ("out_ipv6_pass_packets", "The number of IPv6 outgoing packets that were passed", |s| s.out6_pass_packets),
    ("in_ipv6_block_packets", "The number of IPv6 incoming packets that were blocked", |s| s.in6_block_packets),
    ("out_ipv6_block_packets", "The number of IPv6 outgoing packets that were blocked", |s| s.out6_block_packets),
];

pub struct FirewallCollector {
    instance: String,
    counters: Vec<(MetricDesc, Extractor)>,
}

impl FirewallCollector {
    pub fn new() -> Self {
        let counters = PACKET_COUNTERS
            .iter()
            .map(|&(name, help, extract)| {
                (MetricDesc::gauge(FIREWALL, name, help, &["interface"]), extract)
            })
            .collect();
        Self {
            instance: String::new(),
            counters,
        }
    }
}

impl Default for FirewallCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for FirewallCollector {
    fn name(&self) -> &'static str {
        FIREWALL
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        self.counters.iter().map(|(desc, _)| desc).collect()
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let stats = client.fetch_pf_stats_by_interface().await?;

        for interface in &stats.interfaces {
            for (desc, extract) in &self.counters {
                out.emit(
                    desc,
                    extract(interface) as f64,
                    &[&interface.interface, &self.instance],
                );
            }
        }
        Ok(())
    }
}
