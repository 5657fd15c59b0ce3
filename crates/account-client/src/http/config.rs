use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("steward/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the target service.
///
/// The endpoint paths are fixed; only the gateway root moves between
/// deployments, so that is the single URL knob.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root of the service API, without a trailing slash.
    pub base_url: String,

    /// User agent presented on every request.
    pub user_agent: String,

    /// Overall deadline for a single HTTP request.
    pub request_timeout: Duration,

    /// Deadline for establishing the connection.
    pub connect_timeout: Duration,

    /// Name the service shows as the sender on gift messages.
    pub client_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://account.example.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            client_name: "steward".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Absolute URL for an endpoint path.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_doubled_slashes() {
        let config = ServiceConfig::default().with_base_url("https://svc.test/");
        assert_eq!(config.endpoint("/auth/login"), "https://svc.test/auth/login");
    }
}
