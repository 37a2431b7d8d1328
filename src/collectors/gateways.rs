//! Gateway Status Metrics Collector
//!
//! # Metrics Produced
//! Per gateway, labelled `name`, `address`:
//! - `opnsense_gateways_status` - 1 = online, 0 = offline, 2 = unknown
//! - `opnsense_gateways_loss_percentage`
//! - `opnsense_gateways_rtt_milliseconds`
//! - `opnsense_gateways_rttd_milliseconds`
//!
//! Loss and RTT values the gateway daemon has not computed yet (`~`) are omitted.

use super::{Emitter, MetricDesc, SourceAdapter, GATEWAYS};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct GatewaysCollector {
    instance: String,
    status: MetricDesc,
    loss_percentage: MetricDesc,
    rtt: MetricDesc,
    rttd: MetricDesc,
}

impl GatewaysCollector {
    pub fn new() -> Self {
        const LABELS: &[&str] = &["name", "address"];
        Self {
            instance: String::new(),
            status: MetricDesc::gauge(
                GATEWAYS,
                "status",
                "Status of the gateway by name and address (1 = online, 0 = offline, 2 = unknown)",
                LABELS,
            ),
            loss_percentage: MetricDesc::gauge(
                GATEWAYS,
                "loss_percentage",
                "The current gateway loss percentage by name and address",
                LABELS,
            ),
            rtt: MetricDesc::gauge(
                GATEWAYS,
                "rtt_milliseconds",
                "RTT is the average (mean) of the round trip time in milliseconds by name and address",
                LABELS,
            ),
            rttd: MetricDesc::gauge(
                GATEWAYS,
                "rttd_milliseconds",
                "RTTd is the standard deviation of the round trip time in milliseconds by name and address",
                LABELS,
            ),
        }
    }
}

impl Default for GatewaysCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for GatewaysCollector {
    fn name(&self) -> &'static str {
        GATEWAYS
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![&self.status, &self.loss_percentage, &self.rtt, &self.rttd]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let data = client.fetch_gateways().await?;

        for gateway in &data.gateways {
            let labels: [&str; 3] = [gateway.name.as_str(), &gateway.address, &self.instance];
            out.emit(&self.status, gateway.status.as_value(), &labels);

            if let Some(loss) = gateway.loss_percentage {
                out.emit(&self.loss_percentage, loss, &labels);
            }
            if let Some(rtt) = gateway.rtt_milliseconds {
                out.emit(&self.rtt, rtt, &labels);
            }
            if let Some(rttd) = gateway.rttd_milliseconds {
                out.emit(&self.rttd, rttd, &labels);
            }
        }
        Ok(())
    }
}
