//! Unbound DNS Metrics Collector
//!
//! # Metrics Produced
//! - `opnsense_unbound_dns_uptime_seconds`
//! - `opnsense_unbound_dns_queries_total`
//! - `opnsense_unbound_dns_cache_hits_total` / `cache_misses_total`
//! - `opnsense_unbound_dns_answers_bogus_total` / `answers_secure_total`
//! - `opnsense_unbound_dns_answer_rcodes_total` - Labels: rcode
//! - `opnsense_unbound_dns_query_types_total` - Labels: type
//!
//! Any statistic that does not parse fails the collector for this scrape.

use super::{Emitter, MetricDesc, SourceAdapter, UNBOUND_DNS};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct UnboundDnsCollector {
    instance: String,
    uptime: MetricDesc,
    queries: MetricDesc,
    cache_hits: MetricDesc,
    cache_misses: MetricDesc,
    answers_bogus: MetricDesc,
    answers_secure: MetricDesc,
    answer_rcodes: MetricDesc,
    query_types: MetricDesc,
}

impl UnboundDnsCollector {
    pub fn new() -> Self {
        Self {
            instance: String::new(),
            uptime: MetricDesc::gauge(
                UNBOUND_DNS,
                "uptime_seconds",
                "Uptime of the unbound DNS service in seconds",
                &[],
            ),
            queries: MetricDesc::counter(
                UNBOUND_DNS,
                "queries_total",
                "Total number of queries received",
                &[],
            ),
            cache_hits: MetricDesc::counter(
                UNBOUND_DNS,
                "cache_hits_total",
                "Total number of queries answered from cache",
                &[],
            ),
            cache_misses: MetricDesc::counter(
                UNBOUND_DNS,
                "cache_misses_total",
                "Total number of queries that needed recursive processing",
                &[],
            ),
            answers_bogus: MetricDesc::counter(
                UNBOUND_DNS,
                "answers_bogus_total",
                "Total number of answers that were bogus",
                &[],
            ),
            answers_secure: MetricDesc::counter(
                UNBOUND_DNS,
                "answers_secure_total",
                "Total number of answers that were secure",
                &[],
            ),
            answer_rcodes: MetricDesc::counter(
                UNBOUND_DNS,
                "answer_rcodes_total",
                "Total number of answers by response code",
                &["rcode"],
            ),
            query_types: MetricDesc::counter(
                UNBOUND_DNS,
                "query_types_total",
                "Total number of queries by query type",
                &["type"],
            ),
        }
    }
}

impl Default for UnboundDnsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for UnboundDnsCollector {
    fn name(&self) -> &'static str {
        UNBOUND_DNS
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![
            &self.uptime,
            &self.queries,
            &self.cache_hits,
            &self.cache_misses,
            &self.answers_bogus,
            &self.answers_secure,
            &self.answer_rcodes,
            &self.query_types,
        ]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let data = client.fetch_unbound_overview().await?;
        let instance = [self.instance.as_str()];

        out.emit(&self.uptime, data.uptime_seconds, &instance);
        out.emit(&self.queries, data.queries_total as f64, &instance);
        out.emit(&self.cache_hits, data.cache_hits_total as f64, &instance);
        out.emit(&self.cache_misses, data.cache_misses_total as f64, &instance);
        out.emit(&self.answers_bogus, data.answers_bogus_total as f64, &instance);
        out.emit(&self.answers_secure, data.answers_secure_total as f64, &instance);

        for (rcode, count) in &data.answer_rcodes {
            out.emit(&self.answer_rcodes, *count as f64, &[rcode, &self.instance]);
        }
        for (query_type, count) in &data.query_types {
            out.emit(&self.query_types, *count as f64, &[query_type, &self.instance]);
        }
        Ok(())
    }
}
