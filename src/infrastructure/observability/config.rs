//! Observability configuration

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Prometheus metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter
    #[serde(default)]
    pub enabled: bool,
    /// Address the scrape endpoint listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9464))
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_listen_addr(),
        }
    }
}

impl MetricsConfig {
    /// Enables the exporter on the given address
    pub fn listening_on(addr: SocketAddr) -> Self {
        Self {
            enabled: true,
            listen_addr: addr,
        }
    }
}
