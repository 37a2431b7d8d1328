//! Scrape orchestration
//!
//! One [`Scraper::scrape`] call is one pass:
//!
//! 1. take the scrape lock (passes never overlap)
//! 2. check system health; if the check fails or reports the system down, mark
//!    the target down and skip the collectors
//! 3. run every registered collector as its own task and wait for all of them
//! 4. count failures per endpoint, bump the scrape counter, render
//!
//! A failing collector never cancels or delays its siblings, and nothing here is
//! fatal: the rendered document is always well formed.

use crate::collectors::{Emitter, MetricDesc, Sample, SourceAdapter};
use crate::metrics::MetricsCollector;
use crate::opnsense::{FetchError, HealthStatus, OpnSenseClient};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Outcome of a collector task
type TaskResult = (&'static str, Vec<Sample>, Result<(), FetchError>);

pub struct Scraper {
    client: Arc<OpnSenseClient>,
    adapters: Arc<[Arc<dyn SourceAdapter>]>,
    descs: BTreeMap<String, MetricDesc>,
    metrics: MetricsCollector,
    lock: Mutex<()>,
}

impl Scraper {
    pub fn new(
        client: Arc<OpnSenseClient>,
        adapters: Arc<[Arc<dyn SourceAdapter>]>,
        metrics: MetricsCollector,
    ) -> Self {
        let descs = adapters
            .iter()
            .flat_map(|adapter| adapter.describe())
            .map(|desc| (desc.fq_name.clone(), desc.clone()))
            .collect();

        Self {
            client,
            adapters,
            descs,
            metrics,
            lock: Mutex::new(()),
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn client(&self) -> &Arc<OpnSenseClient> {
        &self.client
    }

    /// Names of the active collectors
    pub fn collector_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|adapter| adapter.name()).collect()
    }

    /// Run one full pass and render it in Prometheus text format
    pub async fn scrape(&self) -> anyhow::Result<String> {
        let _guard = self.lock.lock().await;
        let samples = self.collect().await;
        self.metrics.render_scrape(&self.descs, &samples)
    }

    /// Run one full pass and return the collector samples without rendering
    pub async fn collect_samples(&self) -> Vec<Sample> {
        let _guard = self.lock.lock().await;
        self.collect().await
    }

    async fn collect(&self) -> Vec<Sample> {
        let mut samples = Vec::new();

        if self.check_health().await {
            samples = self.fan_out().await;
        }

        self.metrics.record_scrape();
        samples
    }

    async fn check_health(&self) -> bool {
        let status = match self.client.health_check().await {
            Ok(response) => response.normalize(),
            Err(e) => {
                error!(error = %e, "failed to fetch system health status; skipping other metrics");
                self.metrics.set_health(HealthStatus::DOWN);
                return false;
            }
        };

        self.metrics.set_health(status);
        if !status.system_up {
            warn!("OPNsense reports the system as unhealthy; skipping other metrics");
        }
        status.system_up
    }

    async fn fan_out(&self) -> Vec<Sample> {
        let mut tasks: JoinSet<TaskResult> = JoinSet::new();

        for adapter in self.adapters.iter() {
            let adapter = Arc::clone(adapter);
            let client = Arc::clone(&self.client);
            tasks.spawn(async move {
                let mut out = Emitter::new();
                let result = adapter.update(&client, &mut out).await;
                (adapter.name(), out.into_samples(), result)
            });
        }

        let mut samples = Vec::new();
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, emitted, result)) => {
                    if let Err(e) = result {
                        failed += 1;
                        error!(
                            collector = name,
                            endpoint = e.endpoint(),
                            status_code = e.status_code(),
                            error = %e,
                            "failed to update"
                        );
                        self.metrics.record_endpoint_error(e.endpoint());
                    }
                    debug!(collector = name, samples = emitted.len(), "collector finished");
                    samples.extend(emitted);
                }
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "collector task did not complete");
                }
            }
        }

        info!(
            collectors = self.adapters.len(),
            failed,
            samples = samples.len(),
            "scrape finished"
        );
        samples
    }
}
