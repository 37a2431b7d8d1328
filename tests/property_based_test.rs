//! Property-based tests using proptest
//!
//! Tests that verify properties hold for arbitrary inputs.

use proptest::prelude::*;
use opnsense_exporter::collectors::{AdapterRegistry, Emitter, MetricDesc, SERVICES};
use opnsense_exporter::metrics::MetricsCollector;
use std::collections::BTreeMap;

fn all_names() -> Vec<&'static str> {
    AdapterRegistry::with_all().names()
}

proptest! {
    #[test]
    fn test_disabling_any_subset_keeps_the_rest(mask in proptest::collection::vec(any::<bool>(), 13)) {
        // Given: An arbitrary subset of collector names to disable
        let names = all_names();
        let disabled: Vec<&str> = names
            .iter()
            .zip(&mask)
            .filter(|(_, off)| **off)
            .map(|(name, _)| *name)
            .collect();

        // When: Removing them from a full registry
        let mut registry = AdapterRegistry::with_all();
        registry.without_all(disabled.iter().copied()).unwrap();

        // Then: Exactly the others remain, in registry order
        let expected: Vec<&str> = names
            .iter()
            .filter(|name| !disabled.contains(*name))
            .copied()
            .collect();
        prop_assert_eq!(registry.names(), expected);
    }

    #[test]
    fn test_unknown_names_never_remove_anything(name in "[a-z_]{1,20}") {
        prop_assume!(!all_names().contains(&name.as_str()));

        let mut registry = AdapterRegistry::with_all();
        prop_assert!(registry.without(&name).is_err());
        prop_assert_eq!(registry.len(), 13);
    }

    #[test]
    fn test_any_label_value_renders_without_panic(name in "\\PC*", description in "\\PC*") {
        // Given: A service sample with arbitrary label values
        let metrics = MetricsCollector::new("fw1", ["services"]).unwrap();
        let status = MetricDesc::gauge(SERVICES, "status", "Service status", &["name", "description"]);
        let mut out = Emitter::new();
        out.emit(&status, 1.0, &[name.as_str(), description.as_str(), "fw1"]);

        let descs: BTreeMap<String, MetricDesc> =
            [(status.fq_name.clone(), status)].into_iter().collect();

        // When: Rendering
        let result = metrics.render_scrape(&descs, out.samples());

        // Then: Rendering should not fail
        prop_assert!(result.is_ok());
    }

    #[test]
    fn test_any_instance_label_builds_meta_metrics(instance in "[a-zA-Z0-9._-]{1,32}") {
        let metrics = MetricsCollector::new(&instance, ["arp", "cronJobs"]).unwrap();
        metrics.record_endpoint_error("arp");

        prop_assert_eq!(metrics.endpoint_errors_total("arp"), 1.0);
        prop_assert!(metrics.render().unwrap().contains(&instance));
    }
}
