//! Cron Job Metrics Collector
//!
//! # Metrics Produced
//! - `opnsense_cron_job_status` - Job status (1 = enabled, 0 = disabled)
//!   - Labels: schedule, description, command, origin
//!
//! Rows whose enabled flag cannot be parsed are logged and skipped by the client.

use super::{Emitter, MetricDesc, SourceAdapter, CRON};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct CronCollector {
    instance: String,
    job_status: MetricDesc,
}

impl CronCollector {
    pub fn new() -> Self {
        Self {
            instance: String::new(),
            job_status: MetricDesc::gauge(
                CRON,
                "job_status",
                "Cron job status by name and description (1 = enabled, 0 = disabled)",
                &["schedule", "description", "command", "origin"],
            ),
        }
    }
}

impl Default for CronCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for CronCollector {
    fn name(&self) -> &'static str {
        CRON
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![&self.job_status]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let table = client.fetch_cron_table().await?;

        for job in &table.jobs {
            out.emit(
                &self.job_status,
                if job.enabled { 1.0 } else { 0.0 },
                &[
                    &job.schedule,
                    &job.description,
                    &job.command,
                    &job.origin,
                    &self.instance,
                ],
            );
        }
        Ok(())
    }
}
