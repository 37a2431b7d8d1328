//! Firmware Status Metrics Collector
//!
//! # Metrics Produced
//! Value metrics, each also carrying its value as a label:
//! - `opnsense_firmware_needs_reboot` (-1 when unknown)
//! - `opnsense_firmware_upgrade_needs_reboot` (-1 when unknown)
//! - `opnsense_firmware_new_packages`
//! - `opnsense_firmware_upgrade_packages`
//!
//! Info metrics (value 1), labelled with the reported string:
//! - `opnsense_firmware_last_check`, `os_version`, `product_abi`, `product_id`,
//!   `product_version`

use super::{Emitter, MetricDesc, SourceAdapter, FIRMWARE};
use crate::opnsense::{FetchError, OpnSenseClient};
use async_trait::async_trait;

pub struct FirmwareCollector {
    instance: String,
    needs_reboot: MetricDesc,
    upgrade_needs_reboot: MetricDesc,
    new_packages: MetricDesc,
    upgrade_packages: MetricDesc,
    last_check: MetricDesc,
    os_version: MetricDesc,
    product_abi: MetricDesc,
    product_id: MetricDesc,
    product_version: MetricDesc,
}

impl FirmwareCollector {
    pub fn new() -> Self {
        let desc = |name: &str, help: &str| MetricDesc::gauge(FIRMWARE, name, help, &[name]);
        Self {
            instance: String::new(),
            needs_reboot: desc("needs_reboot", "opnsense would like to be rebooted"),
            upgrade_needs_reboot: desc("upgrade_needs_reboot", "upgrade involves reboot"),
            new_packages: desc("new_packages", "new packages"),
            upgrade_packages: desc("upgrade_packages", "upgrade packages"),
            last_check: desc("last_check", "last check for upgrade"),
            os_version: desc("os_version", "Version of this opnSense"),
            product_abi: desc("product_abi", "Product ABI of this opnSense"),
            product_id: desc("product_id", "Product ID of this opnSense"),
            product_version: desc("product_version", "Product Version of this opnSense"),
        }
    }

    fn emit_value(&self, out: &mut Emitter, desc: &MetricDesc, value: i64) {
        out.emit(desc, value as f64, &[&value.to_string(), &self.instance]);
    }

    fn emit_info(&self, out: &mut Emitter, desc: &MetricDesc, value: &str) {
        out.emit(desc, 1.0, &[value, &self.instance]);
    }
}

impl Default for FirmwareCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for FirmwareCollector {
    fn name(&self) -> &'static str {
        FIRMWARE
    }

    fn register(&mut self, instance: &str) {
        self.instance = instance.to_string();
    }

    fn describe(&self) -> Vec<&MetricDesc> {
        vec![
            &self.needs_reboot,
            &self.upgrade_needs_reboot,
            &self.new_packages,
            &self.upgrade_packages,
            &self.last_check,
            &self.os_version,
            &self.product_abi,
            &self.product_id,
            &self.product_version,
        ]
    }

    async fn update(&self, client: &OpnSenseClient, out: &mut Emitter) -> Result<(), FetchError> {
        let status = client.fetch_firmware_status().await?;

        self.emit_value(out, &self.needs_reboot, status.needs_reboot);
        self.emit_value(out, &self.upgrade_needs_reboot, status.upgrade_needs_reboot);
        self.emit_value(out, &self.new_packages, status.new_packages as i64);
        self.emit_value(out, &self.upgrade_packages, status.upgrade_packages as i64);

        self.emit_info(out, &self.last_check, &status.last_check);
        self.emit_info(out, &self.os_version, &status.os_version);
        self.emit_info(out, &self.product_abi, &status.product_abi);
        self.emit_info(out, &self.product_id, &status.product_id);
        self.emit_info(out, &self.product_version, &status.product_version);
        Ok(())
    }
}
