//! Prometheus Metrics Definitions
//!
//! This module owns the exporter's own metrics and the text rendering of a scrape.
//!
//! # Meta Metrics
//!
//! These live in a persistent registry and survive across scrapes:
//! - `opnsense_up` - Whether the last health check succeeded (1 = yes, 0 = no)
//! - `opnsense_firewall_status` - Firewall health reported by the health check (1 = ok, 0 = errors)
//! - `opnsense_exporter_scrapes_total` - Completed scrape passes
//! - `opnsense_exporter_endpoint_errors_total` - Failed collector calls by endpoint
//!
//! The up and firewall gauges carry `opnsense_instance` as a constant label; the
//! counters carry it as a regular label.
//!
//! Unless disabled, the same registry also holds the standard `process_*`
//! metrics of the exporter process (Linux only).
//!
//! # Collector Metrics
//!
//! Collector samples are rebuilt from scratch on every scrape: a fresh registry is
//! filled from the pass's [`Sample`]s and gathered next to the persistent one. A
//! series that disappears upstream therefore disappears from the output as well.

use crate::collectors::{MetricDesc, MetricKind, Sample, INSTANCE_LABEL};
use crate::error::Result;
use crate::opnsense::HealthStatus;
use prometheus::{CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Meta metrics for one exporter instance
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,
    instance: String,

    pub up: Arc<Gauge>,
    pub firewall_status: Arc<Gauge>,
    pub scrapes: Arc<CounterVec>,
    pub endpoint_errors: Arc<CounterVec>,
}

impl MetricsCollector {
    /// Build and register the meta metrics.
    ///
    /// The scrape counter and one endpoint error counter per name in `endpoints`
    /// are created at 0, so they show up before the first failure.
    pub fn new<'a, I>(instance: &str, endpoints: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let registry = Registry::new();

        let up = Gauge::with_opts(
            Opts::new(
                "up",
                "Was the last scrape of OPNsense successful. (1 = yes, 0 = no)",
            )
            .namespace("opnsense")
            .const_label(INSTANCE_LABEL, instance),
        )?;

        let firewall_status = Gauge::with_opts(
            Opts::new(
                "firewall_status",
                "Status of the firewall reported by the system health check (1 = ok, 0 = errors)",
            )
            .namespace("opnsense")
            .const_label(INSTANCE_LABEL, instance),
        )?;

        let scrapes = CounterVec::new(
            Opts::new(
                "exporter_scrapes_total",
                "Total number of times OPNsense was scraped for metrics.",
            )
            .namespace("opnsense"),
            &[INSTANCE_LABEL],
        )?;

        let endpoint_errors = CounterVec::new(
            Opts::new(
                "exporter_endpoint_errors_total",
                "Total number of errors by endpoint returned by the OPNsense API during data fetching",
            )
            .namespace("opnsense"),
            &["endpoint", INSTANCE_LABEL],
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(firewall_status.clone()))?;
        registry.register(Box::new(scrapes.clone()))?;
        registry.register(Box::new(endpoint_errors.clone()))?;

        scrapes.with_label_values(&[instance]).inc_by(0.0);
        for endpoint in endpoints {
            endpoint_errors
                .with_label_values(&[endpoint, instance])
                .inc_by(0.0);
        }

        Ok(Self {
            registry: Arc::new(registry),
            instance: instance.to_string(),
            up: Arc::new(up),
            firewall_status: Arc::new(firewall_status),
            scrapes: Arc::new(scrapes),
            endpoint_errors: Arc::new(endpoint_errors),
        })
    }

    /// Add the `process_*` metrics about the exporter process itself
    pub fn register_process_metrics(&self) -> Result<()> {
        #[cfg(target_os = "linux")]
        self.registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;
        Ok(())
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Set the up and firewall gauges from a health check outcome
    pub fn set_health(&self, status: HealthStatus) {
        self.up.set(if status.system_up { 1.0 } else { 0.0 });
        self.firewall_status
            .set(if status.firewall_ok { 1.0 } else { 0.0 });
    }

    pub fn is_up(&self) -> bool {
        self.up.get() >= 1.0
    }

    pub fn record_endpoint_error(&self, endpoint: &str) {
        self.endpoint_errors
            .with_label_values(&[endpoint, self.instance.as_str()])
            .inc();
    }

    pub fn record_scrape(&self) {
        self.scrapes.with_label_values(&[self.instance.as_str()]).inc();
    }

    pub fn scrapes_total(&self) -> f64 {
        self.scrapes.with_label_values(&[self.instance.as_str()]).get()
    }

    pub fn endpoint_errors_total(&self, endpoint: &str) -> f64 {
        self.endpoint_errors
            .with_label_values(&[endpoint, self.instance.as_str()])
            .get()
    }

    /// Render the meta metrics only
    pub fn render(&self) -> anyhow::Result<String> {
        encode(&self.registry.gather())
    }

    /// Render one scrape: the pass's collector samples followed by the meta metrics.
    ///
    /// `descs` maps metric names to their descriptors; samples without a descriptor
    /// or with bad label values are logged and skipped.
    pub fn render_scrape(
        &self,
        descs: &BTreeMap<String, MetricDesc>,
        samples: &[Sample],
    ) -> anyhow::Result<String> {
        let pass = build_pass_registry(descs, samples)?;
        let mut families = pass.gather();
        families.extend(self.registry.gather());
        encode(&families)
    }
}

fn build_pass_registry(
    descs: &BTreeMap<String, MetricDesc>,
    samples: &[Sample],
) -> Result<Registry> {
    let mut by_name: BTreeMap<&str, Vec<&Sample>> = BTreeMap::new();
    for sample in samples {
        by_name.entry(&sample.fq_name).or_default().push(sample);
    }

    let registry = Registry::new();
    for (name, samples) in by_name {
        let Some(desc) = descs.get(name) else {
            warn!(metric = name, "dropping samples without a descriptor");
            continue;
        };
        let labels: Vec<&str> = desc.labels.iter().map(String::as_str).collect();
        let opts = Opts::new(desc.fq_name.clone(), desc.help.clone());

        match desc.kind {
            MetricKind::Gauge => {
                let vec = GaugeVec::new(opts, &labels)?;
                for sample in samples {
                    let values: Vec<&str> = sample.label_values.iter().map(String::as_str).collect();
                    match vec.get_metric_with_label_values(values.as_slice()) {
                        Ok(gauge) => gauge.set(sample.value),
                        Err(e) => warn!(metric = name, error = %e, "dropping sample"),
                    }
                }
                registry.register(Box::new(vec))?;
            }
            MetricKind::Counter => {
                let vec = CounterVec::new(opts, &labels)?;
                for sample in samples {
                    let values: Vec<&str> = sample.label_values.iter().map(String::as_str).collect();
                    match vec.get_metric_with_label_values(values.as_slice()) {
                        Ok(counter) => {
                            // Upstream totals are absolute; last sample for a series wins
                            counter.reset();
                            counter.inc_by(sample.value.max(0.0));
                        }
                        Err(e) => warn!(metric = name, error = %e, "dropping sample"),
                    }
                }
                registry.register(Box::new(vec))?;
            }
        }
    }
    Ok(registry)
}

fn encode(families: &[prometheus::proto::MetricFamily]) -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{Emitter, CRON, SERVICES};

    #[test]
    fn test_endpoint_errors_preregistered() {
        let metrics = MetricsCollector::new("fw1", ["arp", "cronJobs"]).unwrap();
        let output = metrics.render().unwrap();

        assert!(output
            .contains(r#"opnsense_exporter_endpoint_errors_total{endpoint="arp",opnsense_instance="fw1"} 0"#));
        assert!(output.contains(
            r#"opnsense_exporter_endpoint_errors_total{endpoint="cronJobs",opnsense_instance="fw1"} 0"#
        ));
        assert!(output.contains(r#"opnsense_exporter_scrapes_total{opnsense_instance="fw1"} 0"#));
    }

    #[test]
    fn test_health_gauges() {
        let metrics = MetricsCollector::new("fw1", std::iter::empty()).unwrap();
        metrics.set_health(HealthStatus {
            system_up: true,
            firewall_ok: false,
        });

        assert!(metrics.is_up());
        let output = metrics.render().unwrap();
        assert!(output.contains(r#"opnsense_up{opnsense_instance="fw1"} 1"#));
        assert!(output.contains(r#"opnsense_firewall_status{opnsense_instance="fw1"} 0"#));

        metrics.set_health(HealthStatus::DOWN);
        assert!(!metrics.is_up());
    }

    #[test]
    fn test_render_scrape_includes_samples_and_meta() {
        let metrics = MetricsCollector::new("fw1", ["services"]).unwrap();
        let status = MetricDesc::gauge(SERVICES, "status", "Service status", &["name"]);
        let jobs = MetricDesc::counter(CRON, "runs_total", "Runs", &[]);

        let mut out = Emitter::new();
        out.emit(&status, 1.0, &["unbound", "fw1"]);
        out.emit(&jobs, 3.0, &["fw1"]);
        out.emit(&jobs, 5.0, &["fw1"]);

        let descs: BTreeMap<String, MetricDesc> = [status, jobs]
            .into_iter()
            .map(|d| (d.fq_name.clone(), d))
            .collect();

        let output = metrics.render_scrape(&descs, out.samples()).unwrap();
        assert!(output.contains(r#"opnsense_services_status{name="unbound",opnsense_instance="fw1"} 1"#));
        assert!(output.contains(r#"opnsense_cron_runs_total{opnsense_instance="fw1"} 5"#));
        assert!(output.contains("# TYPE opnsense_cron_runs_total counter"));
        assert!(output.contains("opnsense_exporter_scrapes_total"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_metrics_are_opt_in() {
        let metrics = MetricsCollector::new("fw1", std::iter::empty()).unwrap();
        assert!(!metrics.render().unwrap().contains("process_cpu_seconds_total"));

        metrics.register_process_metrics().unwrap();
        let output = metrics.render().unwrap();
        assert!(output.contains("process_cpu_seconds_total"));
        assert!(output.contains("process_resident_memory_bytes"));
    }

    #[test]
    fn test_render_scrape_skips_unknown_metric() {
        let metrics = MetricsCollector::new("fw1", std::iter::empty()).unwrap();
        let samples = vec![Sample {
            fq_name: "opnsense_unknown".to_string(),
            label_values: vec!["fw1".to_string()],
            value: 1.0,
        }];

        let output = metrics.render_scrape(&BTreeMap::new(), &samples).unwrap();
        assert!(!output.contains("opnsense_unknown"));
    }
}
