//! Helpers for the numeric strings OPNsense returns in place of numbers.

use crate::opnsense::error::FetchError;

/// Parse an integer string, reporting failures against `endpoint` with status 0
pub(crate) fn parse_int(value: &str, endpoint: &str) -> Result<i64, FetchError> {
    value.trim().parse::<i64>().map_err(|e| {
        FetchError::new(
            endpoint,
            format!("error parsing '{}' to int: {}", value, e),
            0,
        )
    })
}

/// Parse a float string, reporting failures against `endpoint` with status 0
pub(crate) fn parse_float(value: &str, endpoint: &str) -> Result<f64, FetchError> {
    value.trim().parse::<f64>().map_err(|e| {
        FetchError::new(
            endpoint,
            format!("error parsing '{}' to float: {}", value, e),
            0,
        )
    })
}

/// Parse values like `"12.3 ms"` or `"0.0 %"`; `None` if the unit or number is off
pub(crate) fn parse_with_unit(value: &str, unit: &str) -> Option<f64> {
    value
        .trim()
        .strip_suffix(unit)
        .and_then(|number| number.trim_end().parse::<f64>().ok())
}
