//! Scrape pass tests
//!
//! Run whole passes against the fake OPNsense API: health gating, failure
//! isolation between collectors, concurrency of the fan-out and serialization of
//! overlapping scrapes.

mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{FakeOpnSense, Reply, ARP_PATH, HEALTH_PATH, SERVICES_PATH, UNHEALTHY_JSON};
use opnsense_exporter::collectors::arp_table::ArpTableCollector;
use opnsense_exporter::collectors::ipsec::IpsecCollector;
use opnsense_exporter::collectors::services::ServicesCollector;
use opnsense_exporter::collectors::{
    AdapterRegistry, Emitter, MetricDesc, SourceAdapter,
};
use opnsense_exporter::metrics::MetricsCollector;
use opnsense_exporter::opnsense::{FetchError, OpnSenseClient};
use opnsense_exporter::scrape::Scraper;
use reqwest::Method;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

const INSTANCE: &str = "fw1";

const SERVICES_JSON: &str = r#"{"total":2,"rows":[
    {"id":"unbound","name":"unbound","description":"Unbound DNS","running":1},
    {"id":"ntpd","name":"ntpd","description":"Network Time Daemon","running":0}
]}"#;

const IPSEC_PHASE1_PATH: &str = "/api/ipsec/sessions/search_phase1";
const IPSEC_PHASE2_PATH: &str = "/api/ipsec/sessions/search_phase2";

fn scraper(fake: &FakeOpnSense, registry: AdapterRegistry) -> Scraper {
    let client = Arc::new(OpnSenseClient::new(&fake.config()).unwrap());
    let metrics =
        MetricsCollector::new(INSTANCE, client.endpoints().keys().map(String::as_str)).unwrap();
    Scraper::new(client, registry.register_all(INSTANCE), metrics)
}

/// Test collector that logs when it starts and ends
struct RecordingAdapter {
    name: &'static str,
    instance: String,
    value: MetricDesc,
    events: Arc<Mutex<Vec<String>>>,
    barrier: Option<Arc<Barrier>>,
    fail: bool,
}

impl RecordingAdapter {
    fn new(name: &'static str, events: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name,
            instance: String::new(),
            value: MetricDesc::gauge(name, "value", "Test value", &[]),
            events,
            barrier: None,
            fail: false,
        }
    }

    fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl SourceAdapter for RecordingAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![&self.value]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        self.events.lock().unwrap().push(format!("{}:start", self.name));
        match &self.barrier {
            Some(barrier) => {
                barrier.wait().await;
            }
            None => tokio::time::sleep(Duration::from_millis(50)).await,
        }
        out.emit(&self.value, 1.0, &[&self.instance]);
        self.events.lock().unwrap().push(format!("{}:end", self.name));

        if self.fail {
            client
                .fetch::<serde_json::Value>(Method::GET, "notMapped", None)
                .await?;
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_unhealthy_target_skips_collectors() {
    // Given: An upstream reporting the system as down
    let fake = FakeOpnSense::start().await;
    fake.reply(HEALTH_PATH, Reply::json(UNHEALTHY_JSON));
    fake.reply(SERVICES_PATH, Reply::json(SERVICES_JSON));
    let scraper = scraper(&fake, AdapterRegistry::with_all());

    // When: Scraping twice
    scraper.scrape().await.unwrap();
    let output = scraper.scrape().await.unwrap();

    // Then: Only the meta metrics are exposed and no feature endpoint was called
    assert!(output.contains(r#"opnsense_up{opnsense_instance="fw1"} 0"#));
    assert!(output.contains(r#"opnsense_exporter_scrapes_total{opnsense_instance="fw1"} 2"#));
    assert!(!output.contains("opnsense_services_status"));
    assert_eq!(fake.hits(SERVICES_PATH), 0);
    assert_eq!(fake.requests().len(), fake.hits(HEALTH_PATH));
    assert!(!scraper.metrics().is_up());
}

#[tokio::test]
async fn test_failed_health_check_marks_down() {
    // Given: An upstream with no health endpoint at all
    let fake = FakeOpnSense::start().await;
    let scraper = scraper(&fake, AdapterRegistry::with_all());

    let samples = scraper.collect_samples().await;

    assert!(samples.is_empty());
    assert!(!scraper.metrics().is_up());
    assert_eq!(scraper.metrics().scrapes_total(), 1.0);
    assert_eq!(fake.requests().len(), 1);
}

#[tokio::test]
async fn test_failing_collector_does_not_affect_others() {
    // Given: Services answer, the ARP search fails
    let fake = FakeOpnSense::healthy().await;
    fake.reply(SERVICES_PATH, Reply::json(SERVICES_JSON));
    fake.reply(ARP_PATH, Reply::status(StatusCode::BAD_GATEWAY, "bad gateway"));
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(ArpTableCollector::new()),
        Box::new(ServicesCollector::new()),
    ];
    let registry = AdapterRegistry::new(adapters);
    let scraper = scraper(&fake, registry);

    // When: Scraping once
    let output = scraper.scrape().await.unwrap();

    // Then: Services are exposed and the ARP failure is counted once
    assert!(output.contains(r#"opnsense_up{opnsense_instance="fw1"} 1"#));
    assert!(output.contains(
        r#"opnsense_services_status{description="Unbound DNS",name="unbound",opnsense_instance="fw1"} 1"#
    ));
    assert!(output.contains(r#"opnsense_services_running_total{opnsense_instance="fw1"} 1"#));
    assert!(output.contains(r#"opnsense_services_stopped_total{opnsense_instance="fw1"} 1"#));
    assert!(!output.contains("opnsense_arp_table_entries{"));

    assert_eq!(scraper.metrics().endpoint_errors_total("arp"), 1.0);
    assert_eq!(scraper.metrics().endpoint_errors_total("services"), 0.0);
    assert_eq!(fake.hits(ARP_PATH), 1);
}

#[tokio::test]
async fn test_every_collector_failing_still_renders() {
    // Given: A healthy upstream that 404s every feature endpoint
    let fake = FakeOpnSense::healthy().await;
    let scraper = scraper(&fake, AdapterRegistry::with_all());

    // When: Scraping once
    let output = scraper.scrape().await.unwrap();

    // Then: The document is still produced and each failure is counted
    assert!(output.contains(r#"opnsense_up{opnsense_instance="fw1"} 1"#));
    for endpoint in ["arp", "cronJobs", "services", "gatewaysStatus", "dhcpv4"] {
        assert_eq!(
            scraper.metrics().endpoint_errors_total(endpoint),
            1.0,
            "{} should have failed once",
            endpoint
        );
    }
    assert_eq!(scraper.metrics().endpoint_errors_total("healthCheck"), 0.0);
}

#[tokio::test]
async fn test_samples_before_failure_are_kept() {
    let fake = FakeOpnSense::healthy().await;
    let events = Arc::new(Mutex::new(Vec::new()));
    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(RecordingAdapter::new("partial", Arc::clone(&events)).failing())];
    let registry = AdapterRegistry::new(adapters);
    let scraper = scraper(&fake, registry);

    let samples = scraper.collect_samples().await;

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].fq_name, "opnsense_partial_value");
    assert_eq!(samples[0].label_values, vec![INSTANCE.to_string()]);
    assert_eq!(scraper.metrics().endpoint_errors_total("notMapped"), 1.0);
}

#[tokio::test]
async fn test_collectors_run_concurrently() {
    // Given: Two collectors that can only finish once both have started
    let fake = FakeOpnSense::healthy().await;
    let events = Arc::new(Mutex::new(Vec::new()));
    let barrier = Arc::new(Barrier::new(2));
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(RecordingAdapter::new("first", Arc::clone(&events)).with_barrier(Arc::clone(&barrier))),
        Box::new(RecordingAdapter::new("second", Arc::clone(&events)).with_barrier(barrier)),
    ];
    let registry = AdapterRegistry::new(adapters);
    let scraper = scraper(&fake, registry);

    // When: Scraping once
    let output = tokio::time::timeout(Duration::from_secs(5), scraper.scrape())
        .await
        .expect("collectors did not run concurrently")
        .unwrap();

    // Then: Both collectors contributed
    assert!(output.contains(r#"opnsense_first_value{opnsense_instance="fw1"} 1"#));
    assert!(output.contains(r#"opnsense_second_value{opnsense_instance="fw1"} 1"#));
}

#[tokio::test]
async fn test_overlapping_scrapes_are_serialized() {
    // Given: A slow collector
    let fake = FakeOpnSense::healthy().await;
    let events = Arc::new(Mutex::new(Vec::new()));
    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(RecordingAdapter::new("slow", Arc::clone(&events)))];
    let registry = AdapterRegistry::new(adapters);
    let scraper = Arc::new(scraper(&fake, registry));

    // When: Two scrapes are started at the same time
    let (a, b) = tokio::join!(scraper.scrape(), scraper.scrape());
    a.unwrap();
    b.unwrap();

    // Then: The second pass starts only after the first one finished
    let events = events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["slow:start", "slow:end", "slow:start", "slow:end"]
    );
    assert_eq!(scraper.metrics().scrapes_total(), 2.0);
    assert_eq!(fake.hits(HEALTH_PATH), 2);
}

#[tokio::test]
async fn test_every_sample_carries_instance_label_last() {
    let fake = FakeOpnSense::healthy().await;
    fake.reply(SERVICES_PATH, Reply::json(SERVICES_JSON));
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(ServicesCollector::new())];
    let registry = AdapterRegistry::new(adapters);
    let scraper = scraper(&fake, registry);

    let samples = scraper.collect_samples().await;

    assert_eq!(samples.len(), 4);
    for sample in &samples {
        assert_eq!(sample.label_values.last().map(String::as_str), Some(INSTANCE));
    }
    assert_eq!(scraper.collector_names(), vec!["services"]);
}

#[tokio::test]
async fn test_ipsec_phase2_failure_keeps_phase1_series() {
    // Given: Two phase 1 tunnels whose phase 2 lookups both fail
    let fake = FakeOpnSense::healthy().await;
    fake.reply(
        IPSEC_PHASE1_PATH,
        Reply::json(
            r#"{"total":2,"rows":[
                {"phase1desc":"Office","name":"con1","ikeid":"1","connected":true,"install-time":120,
                 "bytes-in":10,"bytes-out":20,"packets-in":1,"packets-out":2},
                {"phase1desc":"Branch","name":"con2","ikeid":"2","connected":false}
            ]}"#,
        ),
    );
    fake.reply(
        IPSEC_PHASE2_PATH,
        Reply::status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
    );
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(IpsecCollector::new())];
    let scraper = scraper(&fake, AdapterRegistry::new(adapters));

    // When: Scraping once
    let output = scraper.scrape().await.unwrap();

    // Then: Every tunnel was still asked for its children
    assert_eq!(fake.hits(IPSEC_PHASE1_PATH), 1);
    assert_eq!(fake.hits(IPSEC_PHASE2_PATH), 2);

    // And: Both phase 1 series are exposed, no phase 2 series is
    assert!(output.contains(
        r#"opnsense_ipsec_phase1_status{description="Office",name="con1",opnsense_instance="fw1"} 1"#
    ));
    assert!(output.contains(
        r#"opnsense_ipsec_phase1_status{description="Branch",name="con2",opnsense_instance="fw1"} 0"#
    ));
    assert!(output.contains(
        r#"opnsense_ipsec_phase1_install_time{description="Office",name="con1",opnsense_instance="fw1"} 120"#
    ));
    assert!(!output.contains("opnsense_ipsec_phase2_"));

    // And: The collector's failure is counted once against phase 2
    assert_eq!(scraper.metrics().endpoint_errors_total("ipsecPhase2"), 1.0);
    assert_eq!(scraper.metrics().endpoint_errors_total("ipsecPhase1"), 0.0);
}

#[tokio::test]
async fn test_ipsec_phase1_failure_skips_phase2() {
    let fake = FakeOpnSense::healthy().await;
    fake.reply(
        IPSEC_PHASE1_PATH,
        Reply::status(StatusCode::BAD_GATEWAY, "bad gateway"),
    );
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(IpsecCollector::new())];
    let scraper = scraper(&fake, AdapterRegistry::new(adapters));

    let output = scraper.scrape().await.unwrap();

    assert!(!output.contains("opnsense_ipsec_"));
    assert_eq!(fake.hits(IPSEC_PHASE2_PATH), 0);
    assert_eq!(scraper.metrics().endpoint_errors_total("ipsecPhase1"), 1.0);
}
