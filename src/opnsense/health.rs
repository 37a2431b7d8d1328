//! System health check response and its normalization.
//!
//! OPNsense reports system and firewall health in two shapes depending on the
//! release: a legacy top-level `{"System": {"status": "OK"}}` and a newer
//! `{"metadata": {"System": {"status": 2}}}` where the status may arrive as a
//! number or a numeric string.

use serde::Deserialize;
use serde_json::Value;

const STATUS_OK: &str = "OK";
const STATUS_OK_NUMERIC: i64 = 2;

#[derive(Debug, Default, Deserialize)]
pub struct HealthCheckResponse {
    #[serde(rename = "System", default)]
    pub system: LegacyStatus,
    #[serde(rename = "Firewall", default)]
    pub firewall: LegacyStatus,
    #[serde(default)]
    pub metadata: HealthMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct LegacyStatus {
    #[serde(default)]
    pub status: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct HealthMetadata {
    #[serde(rename = "System", default)]
    pub system: MetadataStatus,
    #[serde(rename = "Firewall", default)]
    pub firewall: MetadataStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct MetadataStatus {
    #[serde(default)]
    pub status: Value,
}

/// Normalized outcome of one health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStatus {
    pub system_up: bool,
    pub firewall_ok: bool,
}

impl HealthStatus {
    pub const DOWN: Self = Self {
        system_up: false,
        firewall_ok: false,
    };
}

impl HealthCheckResponse {
    /// Collapse both upstream shapes into one outcome.
    ///
    /// The legacy string status is tried first, then the numeric metadata status.
    /// Anything else counts as unhealthy. Firewall health is only meaningful while
    /// the system itself is up.
    pub fn normalize(&self) -> HealthStatus {
        let system_up = is_ok(&self.system.status, &self.metadata.system.status);
        if !system_up {
            return HealthStatus::DOWN;
        }
        HealthStatus {
            system_up,
            firewall_ok: is_ok(&self.firewall.status, &self.metadata.firewall.status),
        }
    }
}

fn is_ok(legacy: &Value, metadata: &Value) -> bool {
    if legacy.as_str() == Some(STATUS_OK) {
        return true;
    }
    numeric_status(metadata) == Some(STATUS_OK_NUMERIC)
}

fn numeric_status(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> HealthStatus {
        serde_json::from_str::<HealthCheckResponse>(json)
            .unwrap()
            .normalize()
    }

    #[test]
    fn test_legacy_shape() {
        let status = parse(r#"{"System":{"status":"OK"},"Firewall":{"status":"OK"}}"#);
        assert_eq!(
            status,
            HealthStatus {
                system_up: true,
                firewall_ok: true
            }
        );

        let status = parse(r#"{"System":{"status":"OK"},"Firewall":{"status":"Error"}}"#);
        assert!(status.system_up);
        assert!(!status.firewall_ok);
    }

    #[test]
    fn test_metadata_shape_accepts_numbers_and_strings() {
        assert!(parse(r#"{"metadata":{"System":{"status":2},"Firewall":{"status":2}}}"#).firewall_ok);
        assert!(parse(r#"{"metadata":{"System":{"status":2.0}}}"#).system_up);
        assert!(parse(r#"{"metadata":{"System":{"status":"2"}}}"#).system_up);
        assert!(!parse(r#"{"metadata":{"System":{"status":"2"},"Firewall":{"status":1}}}"#).firewall_ok);
    }

    #[test]
    fn test_unknown_shapes_are_unhealthy() {
        assert_eq!(parse("{}"), HealthStatus::DOWN);
        assert_eq!(parse(r#"{"System":{"status":"Error"}}"#), HealthStatus::DOWN);
        assert_eq!(parse(r#"{"metadata":{"System":{"status":"abc"}}}"#), HealthStatus::DOWN);
        assert_eq!(parse(r#"{"metadata":{"System":{"status":1}}}"#), HealthStatus::DOWN);
    }

    #[test]
    fn test_firewall_ignored_while_system_down() {
        let status = parse(r#"{"System":{"status":"Error"},"Firewall":{"status":"OK"}}"#);
        assert_eq!(status, HealthStatus::DOWN);
    }
}
