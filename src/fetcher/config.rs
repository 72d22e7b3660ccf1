//! # Fetcher Configuration Module
//!
//! Configuration for the page fetcher: request timeout, user agent and an
//! optional global request rate. Uses the same builder pattern as the rest of
//! the crate's configuration.

use std::num::NonZeroU32;
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// Configuration for the fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Timeout for a single request
    pub timeout: Duration,

    /// User agent to send with every request
    pub user_agent: String,

    /// Global cap on requests per second across all workers
    pub requests_per_second: Option<NonZeroU32>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!(
                "Mozilla/5.0 (compatible; site-enricher/{})",
                env!("CARGO_PKG_VERSION")
            ),
            requests_per_second: None,
        }
    }
}

/// Builder for FetcherConfig
#[derive(Debug, Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetcherConfig::default(),
        }
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the global request rate; zero disables the cap
    pub fn requests_per_second(mut self, rps: u32) -> Self {
        self.config.requests_per_second = NonZeroU32::new(rps);
        self
    }

    /// Build the configuration
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}

impl FetcherConfig {
    /// Create a new builder
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::new()
    }
}
