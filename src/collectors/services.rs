//! Service Status Metrics Collector
//!
//! # Metrics Produced
//! - `opnsense_services_status` - Service status (0 = stopped, 1 = running, 2 = unknown)
//!   - Labels: name, description
//! - `opnsense_services_running_total` - Number of running services
//! - `opnsense_services_stopped_total` - Number of stopped services

use super::{Emitter, MetricDesc, SourceAdapter, SERVICES};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct ServicesCollector {
    instance: String,
    status: MetricDesc,
    running_total: MetricDesc,
    stopped_total: MetricDesc,
}

impl ServicesCollector {
    pub fn new() -> Self {
        Self {
            instance: String::new(),
            status: MetricDesc::gauge(
                SERVICES,
                "status",
                "Service status by name and description (0 = stopped, 1 = running, 2 = unknown)",
                &["name", "description"],
            ),
            running_total: MetricDesc::gauge(
                SERVICES,
                "running_total",
                "Total number of running services",
                &[],
            ),
            stopped_total: MetricDesc::gauge(
                SERVICES,
                "stopped_total",
                "Total number of stopped services",
                &[],
            ),
        }
    }
}

impl Default for ServicesCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for ServicesCollector {
    fn name(&self) -> &'static str {
        SERVICES
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![&self.status, &self.running_total, &self.stopped_total]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let services = client.fetch_services().await?;

        for service in &services.services {
            out.emit(
                &self.status,
                service.status.as_value(),
                &[&service.name, &service.description, &self.instance],
            );
        }
        out.emit(
            &self.running_total,
            services.total_running as f64,
            &[&self.instance],
        );
        out.emit(
            &self.stopped_total,
            services.total_stopped as f64,
            &[&self.instance],
        );
        Ok(())
    }
}
