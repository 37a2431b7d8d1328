use thiserror::Error;

/// A failed call to the OPNsense API.
///
/// Fetch errors are plain values: the client returns them, the scrape loop counts
/// and logs them, and nothing treats them as fatal. A `status_code` of `0` means
/// no HTTP response was ever received (unknown endpoint, transport failure, or a
/// value that could not be parsed after the fact).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "opnsense api call error: endpoint: {endpoint}; failed status code: {status_code}; msg: {message}"
)]
pub struct FetchError {
    endpoint: String,
    message: String,
    status_code: u16,
}

impl FetchError {
    pub(crate) fn new(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            message: message.into(),
            status_code,
        }
    }

    pub(crate) fn endpoint_not_found(endpoint: &str) -> Self {
        Self::new(endpoint, "endpoint not found", 0)
    }

    /// Logical endpoint name the call was made against
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_endpoint_and_status() {
        let err = FetchError::new("arp", "bad gateway", 502);
        let message = err.to_string();

        assert!(message.contains("endpoint: arp"));
        assert!(message.contains("failed status code: 502"));
        assert!(message.contains("bad gateway"));
    }

    #[test]
    fn test_endpoint_not_found_has_no_status() {
        let err = FetchError::endpoint_not_found("cronJobs");
        assert_eq!(err.endpoint(), "cronJobs");
        assert_eq!(err.status_code(), 0);
        assert!(err.message().contains("not found"));
    }
}
