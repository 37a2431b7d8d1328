//! Protocol Statistics Metrics Collector
//!
//! # Metrics Produced
//! - `opnsense_protocol_tcp_connection_count_by_state` - Labels: state
//! - `opnsense_protocol_tcp_sent_packets_total`
//! - `opnsense_protocol_tcp_received_packets_total`
//! - `opnsense_protocol_arp_sent_requests_total`
//! - `opnsense_protocol_arp_received_requests_total`

use super::{Emitter, MetricDesc, SourceAdapter, PROTOCOL};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct ProtocolCollector {
    instance: String,
    tcp_connection_count_by_state: MetricDesc,
    tcp_sent_packets: MetricDesc,
    tcp_received_packets: MetricDesc,
    arp_sent_requests: MetricDesc,
    arp_received_requests: MetricDesc,
}

impl ProtocolCollector {
    pub fn new() -> Self {
        Self {
            instance: String::new(),
            tcp_connection_count_by_state: MetricDesc::gauge(
                PROTOCOL,
                "tcp_connection_count_by_state",
                "Number of TCP connections by state",
                &["state"],
            ),
            tcp_sent_packets: MetricDesc::counter(
                PROTOCOL,
                "tcp_sent_packets_total",
                "Number of sent TCP packets",
                &[],
            ),
            tcp_received_packets: MetricDesc::counter(
                PROTOCOL,
                "tcp_received_packets_total",
                "Number of received TCP packets",
                &[],
            ),
            arp_sent_requests: MetricDesc::counter(
                PROTOCOL,
                "arp_sent_requests_total",
                "Number of sent ARP requests",
                &[],
            ),
            arp_received_requests: MetricDesc::counter(
                PROTOCOL,
                "arp_received_requests_total",
                "Number of received ARP requests",
                &[],
            ),
        }
    }
}

impl Default for ProtocolCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for ProtocolCollector {
    fn name(&self) -> &'static str {
        PROTOCOL
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![
            &self.tcp_connection_count_by_state,
            &self.tcp_sent_packets,
            &self.tcp_received_packets,
            &self.arp_sent_requests,
            &self.arp_received_requests,
        ]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let stats = client.fetch_protocol_statistics().await?;

        for (state, count) in &stats.tcp_connection_count_by_state {
            out.emit(
                &self.tcp_connection_count_by_state,
                *count as f64,
                &[state, &self.instance],
            );
        }

        let instance = [self.instance.as_str()];
        out.emit(&self.tcp_sent_packets, stats.tcp_sent_packets as f64, &instance);
        out.emit(
            &self.tcp_received_packets,
            stats.tcp_received_packets as f64,
            &instance,
        );
        out.emit(
            &self.arp_sent_requests,
            stats.arp_sent_requests as f64,
            &instance,
        );
        out.emit(
            &self.arp_received_requests,
            stats.arp_received_requests as f64,
            &instance,
        );
        Ok(())
    }
}
