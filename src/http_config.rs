//! HTTP client configuration module
//!
//! Centralized timeouts and connection settings for the calendar exchange
//! endpoint.

use crate::error::AppResult;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Total request timeout
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(45),
            user_agent: format!("YearPlanner/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Config for the code-for-events exchange. The exchange does a token
    /// swap plus a full event listing, so it gets a longer ceiling.
    pub fn calendar_exchange(timeout: Duration) -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout,
            ..Self::default()
        }
    }

    /// Build a reqwest client with this configuration
    pub fn build_client(&self) -> AppResult<Client> {
        Ok(ClientBuilder::new()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .build()?)
    }
}
